use crate::TripleExtractor;
use crate::error::ExtractError;
use crate::schema::{ExtractTriplesRequest, ExtractTriplesResponse, Triple};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Extraction delegated to a local REST wrapper (`POST /api/extract-triples`).
#[derive(Clone)]
pub struct ServiceExtractor {
    base_url: String,
    auxiliary_parsing: bool,
    client: reqwest::Client,
}

impl ServiceExtractor {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, ExtractError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auxiliary_parsing: false,
            client,
        })
    }

    pub fn with_auxiliary_parsing(mut self, enabled: bool) -> Self {
        self.auxiliary_parsing = enabled;
        self
    }
}

#[async_trait]
impl TripleExtractor for ServiceExtractor {
    fn name(&self) -> &'static str {
        "service"
    }

    async fn try_extract(&self, text: &str) -> Result<Vec<Triple>, ExtractError> {
        let url = format!("{}/api/extract-triples", self.base_url);
        let request = ExtractTriplesRequest {
            text: text.to_string(),
            use_auxiliary_parsing: Some(self.auxiliary_parsing),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractError::Status(status.as_u16()));
        }

        let body: ExtractTriplesResponse = response.json().await?;
        debug!(count = body.count, triples = body.triples.len(), "Service extraction complete");

        Ok(body.triples)
    }
}

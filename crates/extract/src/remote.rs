use crate::TripleExtractor;
use crate::error::ExtractError;
use crate::llm::ChatClient;
use crate::parser;
use crate::prompt;
use crate::schema::Triple;
use async_trait::async_trait;
use tracing::debug;

/// Extraction backed by a remote generation service.
///
/// Callers are expected to pass a bounded prefix of the document; the prompt
/// is built from whatever text is given.
pub struct RemoteExtractor {
    client: ChatClient,
    auxiliary_parsing: bool,
}

impl RemoteExtractor {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            auxiliary_parsing: false,
        }
    }

    pub fn with_auxiliary_parsing(mut self, enabled: bool) -> Self {
        self.auxiliary_parsing = enabled;
        self
    }
}

#[async_trait]
impl TripleExtractor for RemoteExtractor {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn try_extract(&self, text: &str) -> Result<Vec<Triple>, ExtractError> {
        let prompt = prompt::build_extraction_prompt(text);
        let raw = self.client.complete(&prompt).await?;
        debug!(response_chars = raw.len(), "Generation response received");

        parser::parse_response(&raw, self.auxiliary_parsing)
    }
}

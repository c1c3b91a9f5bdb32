pub mod config;
pub mod error;
pub mod heuristic;
pub mod llm;
pub mod parser;
pub mod prompt;
pub mod remote;
pub mod schema;
pub mod service;

pub use config::{ExtractionConfig, ExtractionStrategy};
pub use error::{ErrorKind, ExtractError};
pub use heuristic::HeuristicExtractor;
pub use llm::ChatClient;
pub use remote::RemoteExtractor;
pub use schema::{ExtractTriplesRequest, ExtractTriplesResponse, ExtractionResult, InvalidTriple, Triple};
pub use service::ServiceExtractor;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{info, warn};

/// Turns document text into triples.
///
/// Implementors only provide [`try_extract`](TripleExtractor::try_extract);
/// [`extract`](TripleExtractor::extract) times the call and folds any error
/// into an empty, unsuccessful [`ExtractionResult`], so a failing document
/// never escapes as an error.
#[async_trait]
pub trait TripleExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn try_extract(&self, text: &str) -> Result<Vec<Triple>, ExtractError>;

    async fn extract(&self, text: &str) -> ExtractionResult {
        let started = Instant::now();
        match self.try_extract(text).await {
            Ok(triples) => ExtractionResult::success(triples, started.elapsed()),
            Err(e) => {
                warn!(extractor = self.name(), error = %e, "Extraction failed");
                ExtractionResult::failure(e.kind(), started.elapsed())
            }
        }
    }
}

/// Build the extractor selected by configuration.
pub fn build_extractor(config: &ExtractionConfig) -> Result<Box<dyn TripleExtractor>> {
    let strategy = config.resolved_strategy();

    let extractor: Box<dyn TripleExtractor> = match strategy {
        ExtractionStrategy::Remote => {
            let api_key = config
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .context("Remote extraction requires an API key")?;

            let client = ChatClient::new(
                config.endpoint.clone(),
                config.model.clone(),
                api_key,
                config.timeout(),
            )
            .context("Failed to build generation client")?
            .with_sampling(config.temperature, config.max_tokens);

            Box::new(RemoteExtractor::new(client).with_auxiliary_parsing(config.auxiliary_parsing))
        }
        ExtractionStrategy::Service => Box::new(
            ServiceExtractor::new(config.service_url.clone(), config.timeout())
                .context("Failed to build service client")?
                .with_auxiliary_parsing(config.auxiliary_parsing),
        ),
        ExtractionStrategy::Heuristic | ExtractionStrategy::Auto => {
            Box::new(HeuristicExtractor::new())
        }
    };

    info!(strategy = %strategy, extractor = extractor.name(), "Extractor ready");
    Ok(extractor)
}

use crate::config::PipelineConfig;
use crate::summary::{DocumentOutcome, DocumentState, RunSummary};
use extract::{ErrorKind, TripleExtractor};
use index::{GraphStats, GraphStore, StoreError};
use ingest::{DocumentEntry, DocumentSource, IngestError};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub throttle: Duration,
    /// 0 disables progress snapshots
    pub progress_every: usize,
    pub max_input_chars: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            throttle: Duration::from_secs(1),
            progress_every: 10,
            max_input_chars: 2000,
        }
    }
}

impl From<&PipelineConfig> for RunOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            throttle: config.run.throttle(),
            progress_every: config.run.progress_every,
            max_input_chars: config.extraction.max_input_chars,
        }
    }
}

/// Drives documents one at a time through read, extract and store.
///
/// Documents run strictly in corpus order with a pause between them. Any
/// per-document failure is recorded in the [`RunSummary`] and the run moves
/// on; only [`Orchestrator::prepare`] can fail.
pub struct Orchestrator {
    extractor: Box<dyn TripleExtractor>,
    store: Box<dyn GraphStore>,
    options: RunOptions,
}

impl Orchestrator {
    pub fn new(
        extractor: Box<dyn TripleExtractor>,
        store: Box<dyn GraphStore>,
        options: RunOptions,
    ) -> Self {
        Self {
            extractor,
            store,
            options,
        }
    }

    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Check the store is reachable and indexed; returns the starting stats.
    pub async fn prepare(&self) -> Result<GraphStats, StoreError> {
        self.store.verify().await?;
        self.store.ensure_indices().await?;

        let stats = self.store.stats().await?;
        info!(
            store = self.store.name(),
            entities = stats.entity_count,
            relations = stats.relation_count,
            "Initial graph stats"
        );
        Ok(stats)
    }

    pub async fn run(&self, source: &DocumentSource) -> RunSummary {
        let total = source.len();
        let mut summary = RunSummary::default();

        info!(
            documents = total,
            extractor = self.extractor.name(),
            store = self.store.name(),
            "Starting run"
        );

        for (idx, entry) in source.iter().enumerate() {
            let position = idx + 1;
            info!(document = %entry.identifier, index = position, total, "Processing document");

            let mut outcome = self.process(source, entry).await;
            summary.record(&outcome);
            outcome.advance(DocumentState::Recorded);
            log_outcome(&outcome);

            if self.options.progress_every > 0 && position % self.options.progress_every == 0 {
                self.report_progress(position, total, &summary).await;
            }

            if position < total && !self.options.throttle.is_zero() {
                sleep(self.options.throttle).await;
            }
        }

        info!(
            processed = summary.documents_processed,
            succeeded = summary.documents_succeeded,
            failed = summary.documents_failed,
            skipped = summary.documents_skipped,
            triples_stored = summary.triples_stored,
            "Run complete"
        );

        summary
    }

    /// Take one document through the state machine. Never fails; the outcome
    /// carries the final state.
    pub async fn process(&self, source: &DocumentSource, entry: &DocumentEntry) -> DocumentOutcome {
        let mut outcome = DocumentOutcome::new(&entry.identifier);

        let document = match source.read(entry).await {
            Ok(document) => document,
            Err(IngestError::TooShort { len, min }) => {
                info!(document = %entry.identifier, len, min, "Skipping (text too short)");
                outcome.advance(DocumentState::Skipped);
                return outcome;
            }
            Err(e) => {
                warn!(document = %entry.identifier, error = %e, "Failed to read document");
                outcome.fail(ErrorKind::ReadFailure, None);
                return outcome;
            }
        };
        outcome.advance(DocumentState::Read);

        let result = self
            .extractor
            .extract(document.prefix(self.options.max_input_chars))
            .await
            .with_source(&document.identifier);
        outcome.extraction_seconds = result.elapsed_seconds;

        let triples = match result.into_triples() {
            Ok(triples) => triples,
            Err(cause) => {
                outcome.fail(ErrorKind::NoTriplesExtracted, Some(cause));
                return outcome;
            }
        };
        outcome.triples_extracted = triples.len();
        outcome.advance(DocumentState::Extracted);

        let valid = triples.iter().filter(|t| t.is_valid()).count();
        if valid < triples.len() {
            info!(
                document = %document.identifier,
                rejected = triples.len() - valid,
                "Dropping invalid triples"
            );
        }
        outcome.advance(DocumentState::Validated);

        match self.store.upsert(&triples, &document.identifier).await {
            Ok(stored) => {
                outcome.triples_stored = stored;
                outcome.advance(DocumentState::Stored);
                if stored == 0 {
                    outcome.fail(ErrorKind::ValidationRejected, None);
                }
            }
            Err(e) => {
                warn!(document = %document.identifier, error = %e, "Failed to store triples");
                outcome.fail(ErrorKind::StoreFailure, Some(e.kind()));
            }
        }

        outcome
    }

    async fn report_progress(&self, position: usize, total: usize, summary: &RunSummary) {
        match self.store.stats().await {
            Ok(stats) => info!(
                processed = position,
                total,
                succeeded = summary.documents_succeeded,
                failed = summary.documents_failed,
                entities = stats.entity_count,
                relations = stats.relation_count,
                "Progress"
            ),
            Err(e) => warn!(error = %e, "Could not fetch graph stats for progress report"),
        }
    }
}

fn log_outcome(outcome: &DocumentOutcome) {
    match outcome.state {
        DocumentState::Failed(kind) => warn!(
            document = %outcome.identifier,
            error_kind = %kind,
            cause = ?outcome.cause,
            triples = outcome.triples_extracted,
            "Document failed"
        ),
        DocumentState::Skipped => {}
        _ => info!(
            document = %outcome.identifier,
            triples = outcome.triples_extracted,
            stored = outcome.triples_stored,
            seconds = outcome.extraction_seconds,
            "Document stored"
        ),
    }
}

use extract::ErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a document ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "error_kind")]
pub enum DocumentState {
    Pending,
    Read,
    Extracted,
    Validated,
    Stored,
    Recorded,
    /// Shorter than the corpus minimum once read; neither success nor failure.
    Skipped,
    Failed(ErrorKind),
}

impl DocumentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Recorded | Self::Skipped | Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub document: String,
    pub error_kind: ErrorKind,
    /// Underlying classification when it differs from `error_kind`, e.g. the
    /// timeout behind a `NoTriplesExtracted`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<ErrorKind>,
}

/// Per-document result handed from the orchestrator to the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentOutcome {
    pub identifier: String,
    pub state: DocumentState,
    pub triples_extracted: usize,
    pub triples_stored: usize,
    pub extraction_seconds: f64,
    pub cause: Option<ErrorKind>,
}

impl DocumentOutcome {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            state: DocumentState::Pending,
            triples_extracted: 0,
            triples_stored: 0,
            extraction_seconds: 0.0,
            cause: None,
        }
    }

    /// Move to `next` unless already in a terminal state.
    pub fn advance(&mut self, next: DocumentState) {
        if !self.state.is_terminal() {
            tracing::debug!(document = %self.identifier, from = ?self.state, to = ?next, "Document state");
            self.state = next;
        }
    }

    pub fn fail(&mut self, kind: ErrorKind, cause: Option<ErrorKind>) {
        self.cause = cause.filter(|c| *c != kind);
        self.advance(DocumentState::Failed(kind));
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, DocumentState::Failed(_))
    }
}

/// Counters for a whole run. Only ever grows while the run is in progress.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub documents_processed: usize,
    pub documents_succeeded: usize,
    pub documents_failed: usize,
    pub documents_skipped: usize,
    pub triples_extracted: usize,
    pub triples_stored: usize,
    /// Time spent in extraction calls, summed over documents.
    pub total_elapsed_seconds: f64,
    pub failures: Vec<DocumentFailure>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &DocumentOutcome) {
        self.documents_processed += 1;
        self.triples_extracted += outcome.triples_extracted;
        self.triples_stored += outcome.triples_stored;
        self.total_elapsed_seconds += outcome.extraction_seconds;

        match outcome.state {
            DocumentState::Failed(kind) => {
                self.documents_failed += 1;
                self.failures.push(DocumentFailure {
                    document: outcome.identifier.clone(),
                    error_kind: kind,
                    cause: outcome.cause,
                });
            }
            DocumentState::Skipped => self.documents_skipped += 1,
            _ => self.documents_succeeded += 1,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.documents_failed > 0
    }

    pub fn seconds_per_triple(&self) -> Option<f64> {
        (self.triples_extracted > 0).then(|| self.total_elapsed_seconds / self.triples_extracted as f64)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Documents processed: {}", self.documents_processed)?;
        writeln!(f, "Successful:          {}", self.documents_succeeded)?;
        writeln!(f, "Failed:              {}", self.documents_failed)?;
        writeln!(f, "Skipped:             {}", self.documents_skipped)?;
        writeln!(f, "Triples extracted:   {}", self.triples_extracted)?;
        writeln!(f, "Triples stored:      {}", self.triples_stored)?;
        write!(
            f,
            "Extraction time:     {:.1}s ({:.1} minutes)",
            self.total_elapsed_seconds,
            self.total_elapsed_seconds / 60.0
        )?;
        if let Some(per_triple) = self.seconds_per_triple() {
            write!(f, "\nAverage per triple:  {:.2}s", per_triple)?;
        }
        for failure in &self.failures {
            write!(f, "\n  failed: {} ({}", failure.document, failure.error_kind)?;
            if let Some(cause) = failure.cause {
                write!(f, ", caused by {}", cause)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

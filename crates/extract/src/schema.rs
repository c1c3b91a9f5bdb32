use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A subject-predicate-object assertion plus the document it came from.
///
/// Fields default to empty when missing from upstream JSON so that a
/// partially filled object still parses; such triples are rejected by
/// [`Triple::normalized`] before they reach a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Triple {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub predicate: String,
    #[serde(default)]
    pub object: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Triple has an empty {field}")]
pub struct InvalidTriple {
    pub field: &'static str,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
            source: String::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Trimmed copy of the triple, or the first field left empty by trimming.
    pub fn normalized(&self) -> Result<Triple, InvalidTriple> {
        let subject = self.subject.trim();
        let predicate = self.predicate.trim();
        let object = self.object.trim();

        if subject.is_empty() {
            return Err(InvalidTriple { field: "subject" });
        }
        if predicate.is_empty() {
            return Err(InvalidTriple { field: "predicate" });
        }
        if object.is_empty() {
            return Err(InvalidTriple { field: "object" });
        }

        Ok(Triple {
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            object: object.to_string(),
            source: self.source.trim().to_string(),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.normalized().is_ok()
    }
}

/// Outcome of extracting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub triples: Vec<Triple>,
    pub elapsed_seconds: f64,
    pub succeeded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ExtractionResult {
    pub fn success(triples: Vec<Triple>, elapsed: Duration) -> Self {
        Self {
            triples,
            elapsed_seconds: elapsed.as_secs_f64(),
            succeeded: true,
            error_kind: None,
        }
    }

    pub fn failure(kind: ErrorKind, elapsed: Duration) -> Self {
        Self {
            triples: Vec::new(),
            elapsed_seconds: elapsed.as_secs_f64(),
            succeeded: false,
            error_kind: Some(kind),
        }
    }

    /// Stamp every triple with the originating document.
    pub fn with_source(mut self, document_id: &str) -> Self {
        for triple in &mut self.triples {
            triple.source = document_id.to_string();
        }
        self
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Usable triples, or the reason there are none.
    pub fn into_triples(self) -> Result<Vec<Triple>, ErrorKind> {
        if !self.succeeded {
            return Err(self.error_kind.unwrap_or(ErrorKind::NoTriplesExtracted));
        }
        if self.triples.is_empty() {
            return Err(ErrorKind::NoTriplesExtracted);
        }
        Ok(self.triples)
    }
}

/// Body of `POST /api/extract-triples`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractTriplesRequest {
    pub text: String,
    #[serde(default)]
    pub use_auxiliary_parsing: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractTriplesResponse {
    pub triples: Vec<Triple>,
    pub count: usize,
}

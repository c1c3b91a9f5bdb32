use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of everything that can go wrong for one document.
///
/// Every kind is recovered at the document boundary; none of them aborts a
/// run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ReadFailure,
    ConnectionFailure,
    Timeout,
    /// The generation service answered with a non-success status.
    UpstreamRejected,
    MalformedResponse,
    ValidationRejected,
    NoTriplesExtracted,
    StoreFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ReadFailure => "read_failure",
            ErrorKind::ConnectionFailure => "connection_failure",
            ErrorKind::Timeout => "timeout",
            ErrorKind::UpstreamRejected => "upstream_rejected",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::ValidationRejected => "validation_rejected",
            ErrorKind::NoTriplesExtracted => "no_triples_extracted",
            ErrorKind::StoreFailure => "store_failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from a single extraction call.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Extraction request timed out")]
    Timeout,

    #[error("Failed to reach extraction service: {0}")]
    Connection(String),

    #[error("Extraction service returned status {0}")]
    Status(u16),

    #[error("Malformed extraction response: {0}")]
    Malformed(String),
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::Timeout => ErrorKind::Timeout,
            ExtractError::Connection(_) => ErrorKind::ConnectionFailure,
            ExtractError::Status(_) => ErrorKind::UpstreamRejected,
            ExtractError::Malformed(_) => ErrorKind::MalformedResponse,
        }
    }
}

impl From<reqwest::Error> for ExtractError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ExtractError::Timeout
        } else if e.is_decode() {
            ExtractError::Malformed(e.to_string())
        } else {
            ExtractError::Connection(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(e: serde_json::Error) -> Self {
        ExtractError::Malformed(e.to_string())
    }
}

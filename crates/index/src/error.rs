use extract::ErrorKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to connect to graph store: {0}")]
    Connection(String),

    #[error("Graph store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Graph query failed: {0}")]
    Query(String),

    #[error("Storage service returned status {0}")]
    Rejected(u16),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Connection(_) => ErrorKind::ConnectionFailure,
            StoreError::Timeout(_) => ErrorKind::Timeout,
            StoreError::Query(_) | StoreError::Rejected(_) => ErrorKind::StoreFailure,
        }
    }
}

impl From<neo4rs::Error> for StoreError {
    fn from(e: neo4rs::Error) -> Self {
        StoreError::Query(e.to_string())
    }
}

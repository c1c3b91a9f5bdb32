pub mod config;
pub mod error;
pub mod memory;
pub mod neo4j_index;
pub mod service;

pub use config::{GraphBackend, GraphConfig};
pub use error::StoreError;
pub use memory::MemoryGraphStore;
pub use neo4j_index::Neo4jGraphStore;
pub use service::ServiceGraphStore;

use anyhow::{Context, Result};
use async_trait::async_trait;
use extract::Triple;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Idempotent materialization of triples as entity nodes and relationship
/// edges.
///
/// Entities are keyed by trimmed name, relationships by
/// `(subject, predicate, object)`. Re-storing a known relationship only
/// overwrites its provenance.
#[async_trait]
pub trait GraphStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cheap round trip proving the store is reachable.
    async fn verify(&self) -> Result<(), StoreError>;

    /// Create-if-absent lookup structure on the entity name.
    async fn ensure_indices(&self) -> Result<(), StoreError>;

    /// Store one already-normalized triple with `document_id` as provenance.
    async fn upsert_triple(&self, triple: &Triple, document_id: &str) -> Result<(), StoreError>;

    async fn stats(&self) -> Result<GraphStats, StoreError>;

    /// Store a document's triples and return how many were stored.
    ///
    /// Invalid triples are skipped and not counted. A store fault on one
    /// triple is logged and skipped; the call only fails when faults left
    /// nothing stored.
    async fn upsert(&self, triples: &[Triple], document_id: &str) -> Result<usize, StoreError> {
        let document_id = document_id.trim();
        let mut stored = 0;
        let mut rejected = 0;
        let mut last_error = None;

        for triple in triples {
            let normalized = match triple.normalized() {
                Ok(t) => t,
                Err(e) => {
                    rejected += 1;
                    debug!(document = document_id, error = %e, "Rejected triple");
                    continue;
                }
            };

            match self.upsert_triple(&normalized, document_id).await {
                Ok(()) => stored += 1,
                Err(e) => {
                    warn!(
                        document = document_id,
                        subject = %normalized.subject,
                        predicate = %normalized.predicate,
                        object = %normalized.object,
                        error = %e,
                        "Failed to store triple"
                    );
                    last_error = Some(e);
                }
            }
        }

        debug!(document = document_id, stored, rejected, "Upsert finished");

        match last_error {
            Some(e) if stored == 0 => Err(e),
            _ => Ok(stored),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub entity_count: usize,
    pub relation_count: usize,
}

/// Body of `POST /api/graph-db/triples`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreTriplesRequest {
    pub triples: Vec<Triple>,
    #[serde(default)]
    pub document_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreTriplesResponse {
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_name: Option<String>,
}

/// Open the backend selected by configuration.
pub async fn connect(config: &GraphConfig) -> Result<Box<dyn GraphStore>> {
    let store: Box<dyn GraphStore> = match config.backend {
        GraphBackend::Neo4j => Box::new(
            Neo4jGraphStore::connect(config)
                .await
                .with_context(|| format!("Failed to connect to Neo4j at {}", config.uri))?,
        ),
        GraphBackend::Service => Box::new(
            ServiceGraphStore::new(config.service_url.clone(), config.timeout())
                .context("Failed to build storage service client")?,
        ),
        GraphBackend::Memory => Box::new(MemoryGraphStore::new()),
    };

    Ok(store)
}

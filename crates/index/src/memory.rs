use crate::error::StoreError;
use crate::{GraphStats, GraphStore};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use extract::Triple;
use std::sync::Arc;

/// Natural key of a relationship edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

/// Process-local graph with the same upsert semantics as the Neo4j store.
///
/// Clones share the same underlying graph.
#[derive(Clone, Default)]
pub struct MemoryGraphStore {
    entities: Arc<DashSet<String>>,
    /// Edge key -> provenance (last writer wins)
    relations: Arc<DashMap<EdgeKey, String>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_entity(&self, name: &str) -> bool {
        self.entities.contains(name)
    }

    pub fn provenance(&self, subject: &str, predicate: &str, object: &str) -> Option<String> {
        let key = EdgeKey {
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            object: object.to_string(),
        };
        self.relations.get(&key).map(|r| r.value().clone())
    }

    /// All stored relationships, sorted by key.
    pub fn triples(&self) -> Vec<Triple> {
        let mut triples: Vec<Triple> = self
            .relations
            .iter()
            .map(|r| {
                let key = r.key();
                Triple::new(&key.subject, &key.predicate, &key.object).with_source(r.value().clone())
            })
            .collect();
        triples.sort_by(|a, b| {
            (&a.subject, &a.predicate, &a.object).cmp(&(&b.subject, &b.predicate, &b.object))
        });
        triples
    }

    pub fn clear(&self) {
        self.entities.clear();
        self.relations.clear();
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn verify(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn ensure_indices(&self) -> Result<(), StoreError> {
        // Entity names are set members already
        Ok(())
    }

    async fn upsert_triple(&self, triple: &Triple, document_id: &str) -> Result<(), StoreError> {
        self.entities.insert(triple.subject.clone());
        self.entities.insert(triple.object.clone());

        let key = EdgeKey {
            subject: triple.subject.clone(),
            predicate: triple.predicate.clone(),
            object: triple.object.clone(),
        };
        self.relations.insert(key, document_id.to_string());
        Ok(())
    }

    async fn stats(&self) -> Result<GraphStats, StoreError> {
        Ok(GraphStats {
            entity_count: self.entities.len(),
            relation_count: self.relations.len(),
        })
    }
}

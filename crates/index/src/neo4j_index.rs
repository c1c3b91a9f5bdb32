use crate::config::GraphConfig;
use crate::error::StoreError;
use crate::{GraphStats, GraphStore};
use async_trait::async_trait;
use extract::Triple;
use neo4rs::{Graph, Query};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

const UPSERT_TRIPLE: &str = r#"
    MERGE (s:Entity {name: $subject})
    MERGE (o:Entity {name: $object})
    MERGE (s)-[r:RELATIONSHIP {type: $predicate}]->(o)
    ON CREATE SET r.source = $source
    ON MATCH SET r.source = $source
"#;

/// Graph store speaking Cypher over bolt.
///
/// One `Graph` handle is shared for the whole run.
pub struct Neo4jGraphStore {
    graph: Graph,
    timeout: Duration,
}

impl Neo4jGraphStore {
    pub fn new(graph: Graph, timeout: Duration) -> Self {
        Self { graph, timeout }
    }

    pub async fn connect(config: &GraphConfig) -> Result<Self, StoreError> {
        let password = config.password.clone().unwrap_or_default();
        let graph = Graph::new(config.uri.as_str(), config.user.as_str(), password.as_str())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!(uri = %config.uri, user = %config.user, "Connected to Neo4j");
        Ok(Self::new(graph, config.timeout()))
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, neo4rs::Error>>,
    {
        match timeout(self.timeout, call).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }

    async fn count(&self, cypher: &str) -> Result<usize, StoreError> {
        let mut result = self.bounded(self.graph.execute(Query::new(cypher.to_string()))).await?;
        let count = match self.bounded(result.next()).await? {
            Some(row) => row.get::<i64>("count").unwrap_or(0) as usize,
            None => 0,
        };
        Ok(count)
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    fn name(&self) -> &'static str {
        "neo4j"
    }

    async fn verify(&self) -> Result<(), StoreError> {
        let mut result = self
            .bounded(self.graph.execute(Query::new("RETURN 1 AS test".to_string())))
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        match self.bounded(result.next()).await? {
            Some(_) => Ok(()),
            None => Err(StoreError::Connection("verification query returned no rows".to_string())),
        }
    }

    async fn ensure_indices(&self) -> Result<(), StoreError> {
        let constraint = Query::new(
            "CREATE CONSTRAINT entity_name_unique IF NOT EXISTS FOR (e:Entity) REQUIRE e.name IS UNIQUE"
                .to_string(),
        );

        if let Err(e) = self.bounded(self.graph.run(constraint)).await {
            // Fails when a plain index already covers the property.
            warn!(error = %e, "Could not create uniqueness constraint, falling back to index");
            let index = Query::new(
                "CREATE INDEX entity_name_index IF NOT EXISTS FOR (e:Entity) ON (e.name)".to_string(),
            );
            self.bounded(self.graph.run(index)).await?;
        }

        info!("Entity name index ready");
        Ok(())
    }

    async fn upsert_triple(&self, triple: &Triple, document_id: &str) -> Result<(), StoreError> {
        let query = Query::new(UPSERT_TRIPLE.to_string())
            .param("subject", triple.subject.clone())
            .param("predicate", triple.predicate.clone())
            .param("object", triple.object.clone())
            .param("source", document_id.to_string());

        self.bounded(self.graph.run(query)).await
    }

    async fn stats(&self) -> Result<GraphStats, StoreError> {
        let entity_count = self.count("MATCH (e:Entity) RETURN count(e) AS count").await?;
        let relation_count = self
            .count("MATCH (:Entity)-[r:RELATIONSHIP]->(:Entity) RETURN count(r) AS count")
            .await?;

        Ok(GraphStats {
            entity_count,
            relation_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_sets_provenance_on_create_and_match() {
        assert!(UPSERT_TRIPLE.contains("ON CREATE SET r.source = $source"));
        assert!(UPSERT_TRIPLE.contains("ON MATCH SET r.source = $source"));
        assert!(UPSERT_TRIPLE.contains("MERGE (s)-[r:RELATIONSHIP {type: $predicate}]->(o)"));
    }

    /// A live store when `NEO4J_URI` is set; these tests pass trivially
    /// otherwise.
    async fn live_store() -> Option<Neo4jGraphStore> {
        let uri = std::env::var("NEO4J_URI").ok()?;
        let config = GraphConfig {
            uri,
            user: std::env::var("NEO4J_USER").unwrap_or_else(|_| "neo4j".to_string()),
            password: std::env::var("NEO4J_PASSWORD").ok(),
            ..GraphConfig::default()
        };
        Some(Neo4jGraphStore::connect(&config).await.unwrap())
    }

    async fn source_of(store: &Neo4jGraphStore, subject: &str, object: &str) -> Option<String> {
        let query = Query::new(
            "MATCH (:Entity {name: $subject})-[r:RELATIONSHIP]->(:Entity {name: $object}) RETURN r.source AS source"
                .to_string(),
        )
        .param("subject", subject.to_string())
        .param("object", object.to_string());

        let mut rows = store.graph.execute(query).await.unwrap();
        rows.next().await.unwrap().map(|row| row.get::<String>("source").unwrap())
    }

    async fn delete_prefixed(store: &Neo4jGraphStore, prefix: &str) {
        let query = Query::new("MATCH (e:Entity) WHERE e.name STARTS WITH $prefix DETACH DELETE e".to_string())
            .param("prefix", prefix.to_string());
        store.graph.run(query).await.unwrap();
    }

    #[tokio::test]
    async fn test_live_verify_and_indices() {
        let Some(store) = live_store().await else {
            return;
        };

        store.verify().await.unwrap();
        store.ensure_indices().await.unwrap();
        store.ensure_indices().await.unwrap();
    }

    #[tokio::test]
    async fn test_live_upsert_is_idempotent_and_last_writer_wins() {
        let Some(store) = live_store().await else {
            return;
        };
        let prefix = "upsert-test-";
        delete_prefixed(&store, prefix).await;

        let triples = vec![Triple::new("upsert-test-gene", "causes", "upsert-test-disease")];
        let before = store.stats().await.unwrap();

        assert_eq!(store.upsert(&triples, "a.txt").await.unwrap(), 1);
        let first = store.stats().await.unwrap();
        assert_eq!(store.upsert(&triples, "b.txt").await.unwrap(), 1);
        let second = store.stats().await.unwrap();

        assert_eq!(first.entity_count, before.entity_count + 2);
        assert_eq!(first.relation_count, before.relation_count + 1);
        assert_eq!(first, second);
        assert_eq!(
            source_of(&store, "upsert-test-gene", "upsert-test-disease").await.as_deref(),
            Some("b.txt")
        );

        delete_prefixed(&store, prefix).await;
    }
}

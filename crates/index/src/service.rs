use crate::error::StoreError;
use crate::{GraphStats, GraphStore, StoreTriplesRequest, StoreTriplesResponse};
use async_trait::async_trait;
use extract::Triple;
use std::time::Duration;
use tracing::debug;

/// Storage delegated to a graph-backed REST service.
///
/// A document's triples go out as one `POST /api/graph-db/triples` and the
/// service reports how many it stored. Indexing is the service's job.
#[derive(Clone)]
pub struct ServiceGraphStore {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ServiceGraphStore {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_err(&self, e: reqwest::Error) -> StoreError {
        if e.is_timeout() {
            StoreError::Timeout(self.timeout)
        } else if e.is_decode() {
            StoreError::Query(e.to_string())
        } else {
            StoreError::Connection(e.to_string())
        }
    }

    async fn post(&self, triples: Vec<Triple>, document_id: &str) -> Result<usize, StoreError> {
        let request = StoreTriplesRequest {
            triples,
            document_name: Some(document_id.to_string()),
        };

        let response = self
            .client
            .post(self.url("/api/graph-db/triples"))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Rejected(status.as_u16()));
        }

        let body: StoreTriplesResponse = response.json().await.map_err(|e| self.map_err(e))?;
        Ok(body.count)
    }
}

#[async_trait]
impl GraphStore for ServiceGraphStore {
    fn name(&self) -> &'static str {
        "service"
    }

    async fn verify(&self) -> Result<(), StoreError> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Rejected(response.status().as_u16()))
        }
    }

    async fn ensure_indices(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert_triple(&self, triple: &Triple, document_id: &str) -> Result<(), StoreError> {
        self.post(vec![triple.clone()], document_id).await.map(|_| ())
    }

    async fn stats(&self) -> Result<GraphStats, StoreError> {
        let response = self
            .client
            .get(self.url("/api/graph-db/stats"))
            .send()
            .await
            .map_err(|e| self.map_err(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Rejected(status.as_u16()));
        }

        response.json().await.map_err(|e| self.map_err(e))
    }

    /// One request per document. Invalid triples are dropped locally and the
    /// count is the one the service reports.
    async fn upsert(&self, triples: &[Triple], document_id: &str) -> Result<usize, StoreError> {
        let document_id = document_id.trim();
        let valid: Vec<Triple> = triples.iter().filter_map(|t| t.normalized().ok()).collect();
        if valid.is_empty() {
            return Ok(0);
        }

        let sent = valid.len();
        let stored = self.post(valid, document_id).await?;
        debug!(document = document_id, sent, stored, "Service upsert finished");
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer, timeout: Duration) -> ServiceGraphStore {
        ServiceGraphStore::new(format!("{}/", server.uri()), timeout).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_posts_document_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/graph-db/triples"))
            .and(body_partial_json(json!({
                "triples": [ { "subject": "Gene X", "predicate": "causes", "object": "Disease Y" } ],
                "documentName": "paper.txt"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 1,
                "documentName": "paper.txt"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let triples = vec![
            Triple::new("  Gene X ", "causes", "Disease Y"),
            Triple::new("", "causes", "Disease Z"),
        ];
        let stored = store(&server, Duration::from_secs(5))
            .upsert(&triples, "paper.txt")
            .await
            .unwrap();

        assert_eq!(stored, 1);
    }

    #[tokio::test]
    async fn test_all_invalid_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let stored = store(&server, Duration::from_secs(5))
            .upsert(&[Triple::new("", "p", "o")], "paper.txt")
            .await
            .unwrap();

        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/graph-db/triples"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "boom" })))
            .mount(&server)
            .await;

        let err = store(&server, Duration::from_secs(5))
            .upsert(&[Triple::new("A", "B", "C")], "paper.txt")
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Rejected(500)));
        assert_eq!(err.kind(), ErrorKind::StoreFailure);
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "count": 1 }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let err = store(&server, Duration::from_millis(100))
            .upsert(&[Triple::new("A", "B", "C")], "paper.txt")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_stats_and_verify() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/graph-db/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entity_count": 4,
                "relation_count": 2
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
            .mount(&server)
            .await;

        let store = store(&server, Duration::from_secs(5));
        store.verify().await.unwrap();
        assert_eq!(
            store.stats().await.unwrap(),
            GraphStats {
                entity_count: 4,
                relation_count: 2
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let store = ServiceGraphStore::new("http://127.0.0.1:1".to_string(), Duration::from_secs(2)).unwrap();
        let err = store.verify().await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConnectionFailure);
    }
}

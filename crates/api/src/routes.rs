use crate::error::ApiError;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use extract::{ExtractTriplesRequest, ExtractTriplesResponse, TripleExtractor};
use index::{GraphStats, GraphStore, StoreTriplesRequest, StoreTriplesResponse};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

const UNNAMED_DOCUMENT: &str = "unnamed";

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<dyn TripleExtractor>,
    /// Same backend with the lenient response parser switched on.
    pub auxiliary_extractor: Arc<dyn TripleExtractor>,
    pub store: Arc<dyn GraphStore>,
    pub max_input_chars: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub extractor: &'static str,
    pub store: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/extract-triples", post(extract_triples))
        .route("/api/graph-db/triples", post(store_triples))
        .route("/api/graph-db/stats", get(graph_stats))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Response {
    let (code, status, error) = match state.store.verify().await {
        Ok(()) => (StatusCode::OK, "ok", None),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, "unavailable", Some(e.to_string())),
    };

    let body = HealthResponse {
        status,
        extractor: state.extractor.name(),
        store: state.store.name(),
        error,
    };
    (code, Json(body)).into_response()
}

/// POST /api/extract-triples
async fn extract_triples(
    State(state): State<AppState>,
    payload: Result<Json<ExtractTriplesRequest>, JsonRejection>,
) -> Result<Json<ExtractTriplesResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Text is required".to_string()));
    }

    let extractor = if request.use_auxiliary_parsing.unwrap_or(false) {
        &state.auxiliary_extractor
    } else {
        &state.extractor
    };

    let started = Instant::now();
    let text = ingest::truncate_chars(&request.text, state.max_input_chars);
    let triples = extractor.try_extract(text).await?;

    info!(
        extractor = extractor.name(),
        input_chars = text.chars().count(),
        triples = triples.len(),
        seconds = started.elapsed().as_secs_f64(),
        "Extracted triples"
    );

    Ok(Json(ExtractTriplesResponse {
        count: triples.len(),
        triples,
    }))
}

/// POST /api/graph-db/triples
async fn store_triples(
    State(state): State<AppState>,
    payload: Result<Json<StoreTriplesRequest>, JsonRejection>,
) -> Result<Json<StoreTriplesResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|_| ApiError::BadRequest("Triples are required".to_string()))?;

    let document = request
        .document_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(UNNAMED_DOCUMENT);

    let count = state.store.upsert(&request.triples, document).await?;
    info!(document, received = request.triples.len(), stored = count, "Stored triples");

    Ok(Json(StoreTriplesResponse {
        count,
        document_name: request.document_name,
    }))
}

/// GET /api/graph-db/stats
async fn graph_stats(State(state): State<AppState>) -> Result<Json<GraphStats>, ApiError> {
    let stats = state.store.stats().await?;
    Ok(Json(stats))
}

/// Fallback JSON for unknown paths.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use extract::{ExtractError, HeuristicExtractor, Triple};
    use index::{MemoryGraphStore, StoreError};
    use serde_json::Value;
    use tower::ServiceExt;

    struct TimeoutExtractor;

    #[async_trait::async_trait]
    impl TripleExtractor for TimeoutExtractor {
        fn name(&self) -> &'static str {
            "timeout"
        }

        async fn try_extract(&self, _text: &str) -> Result<Vec<Triple>, ExtractError> {
            Err(ExtractError::Timeout)
        }
    }

    struct OfflineStore;

    #[async_trait::async_trait]
    impl GraphStore for OfflineStore {
        fn name(&self) -> &'static str {
            "offline"
        }

        async fn verify(&self) -> Result<(), StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }

        async fn ensure_indices(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn upsert_triple(&self, _triple: &Triple, _document_id: &str) -> Result<(), StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }

        async fn stats(&self) -> Result<GraphStats, StoreError> {
            Err(StoreError::Connection("connection refused".to_string()))
        }
    }

    fn state_with(store: Arc<dyn GraphStore>) -> AppState {
        let extractor: Arc<dyn TripleExtractor> = Arc::new(HeuristicExtractor::new());
        AppState {
            extractor: extractor.clone(),
            auxiliary_extractor: extractor,
            store,
            max_input_chars: 2000,
        }
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(v) => Body::from(v.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(state_with(Arc::new(MemoryGraphStore::new())));
        let (status, body) = send(app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store"], "memory");
        assert_eq!(body["extractor"], "heuristic");
    }

    #[tokio::test]
    async fn test_health_check_store_down() {
        let app = create_router(state_with(Arc::new(OfflineStore)));
        let (status, body) = send(app, "GET", "/health", None).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unavailable");
    }

    #[tokio::test]
    async fn test_extract_triples() {
        let app = create_router(state_with(Arc::new(MemoryGraphStore::new())));
        let (status, body) = send(
            app,
            "POST",
            "/api/extract-triples",
            Some(json!({ "text": "Alice studies Gene X. Gene X causes Disease Y." })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["triples"][0]["subject"], "Alice");
        assert_eq!(body["triples"][0]["predicate"], "MENTIONS");
        assert_eq!(body["triples"][1]["object"], "Y");
    }

    #[tokio::test]
    async fn test_extract_truncates_input() {
        let mut state = state_with(Arc::new(MemoryGraphStore::new()));
        state.max_input_chars = 21;
        let app = create_router(state);
        let (status, body) = send(
            app,
            "POST",
            "/api/extract-triples",
            Some(json!({ "text": "Alice studies Gene X. Bob studies Gene Z." })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
    }

    #[tokio::test]
    async fn test_extract_requires_text() {
        let app = create_router(state_with(Arc::new(MemoryGraphStore::new())));
        let (status, body) =
            send(app, "POST", "/api/extract-triples", Some(json!({ "text": "   " }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Text is required");
    }

    #[tokio::test]
    async fn test_extract_timeout_is_gateway_timeout() {
        let mut state = state_with(Arc::new(MemoryGraphStore::new()));
        state.extractor = Arc::new(TimeoutExtractor);
        let app = create_router(state);
        let (status, _) =
            send(app, "POST", "/api/extract-triples", Some(json!({ "text": "Gene X causes Disease Y." }))).await;

        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn test_auxiliary_flag_selects_extractor() {
        let mut state = state_with(Arc::new(MemoryGraphStore::new()));
        state.extractor = Arc::new(TimeoutExtractor);
        let app = create_router(state);
        let (status, body) = send(
            app,
            "POST",
            "/api/extract-triples",
            Some(json!({ "text": "Gene X causes Disease Y.", "useAuxiliaryParsing": true })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
    }

    #[tokio::test]
    async fn test_store_triples_counts_valid_only() {
        let store = MemoryGraphStore::new();
        let app = create_router(state_with(Arc::new(store.clone())));
        let (status, body) = send(
            app,
            "POST",
            "/api/graph-db/triples",
            Some(json!({
                "triples": [
                    { "subject": "Gene X", "predicate": "causes", "object": "Disease Y" },
                    { "subject": "", "predicate": "causes", "object": "Disease Z" }
                ],
                "documentName": "paper.txt"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["documentName"], "paper.txt");
        assert_eq!(store.provenance("Gene X", "causes", "Disease Y").as_deref(), Some("paper.txt"));
    }

    #[tokio::test]
    async fn test_store_triples_requires_array() {
        let app = create_router(state_with(Arc::new(MemoryGraphStore::new())));
        let (status, body) =
            send(app, "POST", "/api/graph-db/triples", Some(json!({ "documentName": "paper.txt" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Triples are required");
    }

    #[tokio::test]
    async fn test_store_failure_is_server_error() {
        let app = create_router(state_with(Arc::new(OfflineStore)));
        let (status, body) = send(
            app,
            "POST",
            "/api/graph-db/triples",
            Some(json!({ "triples": [ { "subject": "A", "predicate": "B", "object": "C" } ] })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Failed to store triples"));
    }

    #[tokio::test]
    async fn test_graph_stats() {
        let store = MemoryGraphStore::new();
        store
            .upsert(&[Triple::new("Gene X", "causes", "Disease Y")], "paper.txt")
            .await
            .unwrap();
        let app = create_router(state_with(Arc::new(store)));
        let (status, body) = send(app, "GET", "/api/graph-db/stats", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entity_count"], 2);
        assert_eq!(body["relation_count"], 1);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = create_router(state_with(Arc::new(MemoryGraphStore::new())));
        let (status, body) = send(app, "GET", "/api/nope", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not found");
    }
}

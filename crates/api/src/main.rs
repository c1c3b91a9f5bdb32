mod error;
mod routes;

use anyhow::{Context, Result, bail};
use extract::{ExtractionConfig, ExtractionStrategy, TripleExtractor};
use pipeline::PipelineConfig;
use routes::AppState;
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_BIND: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> Result<()> {
    let json_logs = std::env::var("LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
    pipeline::logging::init_tracing(json_logs);

    let config_path = std::env::var("PIPELINE_CONFIG").ok().map(PathBuf::from);
    let config = PipelineConfig::load(config_path.as_deref())?;

    // This process is the upstream of both service clients.
    if config.extraction.resolved_strategy() == ExtractionStrategy::Service {
        bail!("The REST wrapper cannot use the service extraction strategy");
    }
    if config.graph.backend == index::GraphBackend::Service {
        bail!("The REST wrapper cannot use the service graph backend");
    }

    let extractor = build(&config.extraction, false)?;
    let auxiliary_extractor = build(&config.extraction, true)?;

    let store: Arc<dyn index::GraphStore> = Arc::from(index::connect(&config.graph).await?);
    store
        .verify()
        .await
        .context("Graph store is not reachable")?;
    store
        .ensure_indices()
        .await
        .context("Failed to create graph indices")?;

    let state = AppState {
        extractor,
        auxiliary_extractor,
        store,
        max_input_chars: config.extraction.max_input_chars,
    };
    let app = routes::create_router(state);

    let bind = std::env::var("API_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    tracing::info!("Server listening on http://{}", bind);

    axum::serve(listener, app).await?;
    Ok(())
}

fn build(config: &ExtractionConfig, auxiliary_parsing: bool) -> Result<Arc<dyn TripleExtractor>> {
    let config = ExtractionConfig {
        auxiliary_parsing,
        ..config.clone()
    };
    Ok(Arc::from(extract::build_extractor(&config)?))
}

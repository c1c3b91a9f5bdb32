use anyhow::{Context, Result};
use extract::{ExtractionConfig, ExtractionStrategy};
use index::{GraphBackend, GraphConfig};
use ingest::CorpusConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything a run needs, read once at process start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub corpus: CorpusConfig,
    pub extraction: ExtractionConfig,
    pub graph: GraphConfig,
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Pause between documents, protecting the shared extraction service.
    pub throttle_ms: u64,
    /// Emit a graph stats snapshot every N documents (0 disables).
    pub progress_every: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            throttle_ms: 1000,
            progress_every: 10,
        }
    }
}

impl RunConfig {
    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}

impl PipelineConfig {
    /// Defaults, then the optional TOML file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply environment overrides through `lookup`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get("CORPUS_PATH") {
            self.corpus.path = PathBuf::from(path);
        }

        if let Some(key) = get("EXTRACTION_API_KEY").or_else(|| get("NVIDIA_API_KEY")) {
            self.extraction.api_key = Some(key);
        }
        if let Some(strategy) = get("EXTRACTION_STRATEGY") {
            self.extraction.strategy = strategy
                .parse::<ExtractionStrategy>()
                .map_err(anyhow::Error::msg)?;
        }
        if let Some(endpoint) = get("EXTRACTION_ENDPOINT") {
            self.extraction.endpoint = endpoint;
        }
        if let Some(model) = get("EXTRACTION_MODEL") {
            self.extraction.model = model;
        }
        if let Some(url) = get("EXTRACTION_SERVICE_URL") {
            self.extraction.service_url = url;
        }
        if let Some(secs) = get("EXTRACTION_TIMEOUT_SECS") {
            self.extraction.timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid EXTRACTION_TIMEOUT_SECS: {}", secs))?;
        }

        if let Some(backend) = get("GRAPH_BACKEND") {
            self.graph.backend = backend.parse::<GraphBackend>().map_err(anyhow::Error::msg)?;
        }
        if let Some(url) = get("GRAPH_SERVICE_URL") {
            self.graph.service_url = url;
        }
        if let Some(uri) = get("NEO4J_URI") {
            self.graph.uri = uri;
        }
        if let Some(user) = get("NEO4J_USER").or_else(|| get("NEO4J_USERNAME")) {
            self.graph.user = user;
        }
        if let Some(password) = get("NEO4J_PASSWORD") {
            self.graph.password = Some(password);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.corpus.extension, "txt");
        assert_eq!(config.corpus.min_chars, 50);
        assert_eq!(config.extraction.max_input_chars, 2000);
        assert_eq!(config.run.throttle(), Duration::from_secs(1));
        assert_eq!(config.run.progress_every, 10);
    }

    #[test]
    fn test_partial_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [corpus]
            path = "/data/biorxiv"
            max_documents = 25

            [extraction]
            strategy = "service"
            auxiliary_parsing = true

            [graph]
            backend = "memory"

            [run]
            throttle_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.corpus.path, PathBuf::from("/data/biorxiv"));
        assert_eq!(config.corpus.max_documents, Some(25));
        assert_eq!(config.corpus.min_chars, 50);
        assert_eq!(config.extraction.strategy, ExtractionStrategy::Service);
        assert!(config.extraction.auxiliary_parsing);
        assert_eq!(config.graph.backend, GraphBackend::Memory);
        assert_eq!(config.run.throttle_ms, 250);
        assert_eq!(config.run.progress_every, 10);
    }

    #[test]
    fn test_bad_toml() {
        assert!(PipelineConfig::from_toml_str("[extraction]\nstrategy = \"magic\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = PipelineConfig::default();
        config
            .apply_env(env(&[
                ("NVIDIA_API_KEY", "nvapi-123"),
                ("NEO4J_URI", "neo4j+s://example.databases.neo4j.io"),
                ("NEO4J_USERNAME", "reader"),
                ("NEO4J_PASSWORD", "secret"),
                ("EXTRACTION_TIMEOUT_SECS", "90"),
            ]))
            .unwrap();

        assert_eq!(config.extraction.api_key.as_deref(), Some("nvapi-123"));
        assert_eq!(config.extraction.resolved_strategy(), ExtractionStrategy::Remote);
        assert_eq!(config.graph.uri, "neo4j+s://example.databases.neo4j.io");
        assert_eq!(config.graph.user, "reader");
        assert_eq!(config.graph.password.as_deref(), Some("secret"));
        assert_eq!(config.extraction.timeout_secs, 90);
    }

    #[test]
    fn test_graph_service_env() {
        let mut config = PipelineConfig::default();
        config
            .apply_env(env(&[
                ("GRAPH_BACKEND", "service"),
                ("GRAPH_SERVICE_URL", "http://graph.internal:3000"),
            ]))
            .unwrap();

        assert_eq!(config.graph.backend, GraphBackend::Service);
        assert_eq!(config.graph.service_url, "http://graph.internal:3000");
    }

    #[test]
    fn test_generic_key_wins_over_vendor_key() {
        let mut config = PipelineConfig::default();
        config
            .apply_env(env(&[("NVIDIA_API_KEY", "vendor"), ("EXTRACTION_API_KEY", "generic")]))
            .unwrap();
        assert_eq!(config.extraction.api_key.as_deref(), Some("generic"));
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut config = PipelineConfig::default();
        config.apply_env(env(&[("NVIDIA_API_KEY", "  ")])).unwrap();
        assert!(config.extraction.api_key.is_none());
    }

    #[test]
    fn test_invalid_env_values_rejected() {
        let mut config = PipelineConfig::default();
        assert!(config.apply_env(env(&[("GRAPH_BACKEND", "arangodb")])).is_err());
        assert!(config.apply_env(env(&[("EXTRACTION_TIMEOUT_SECS", "soon")])).is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GraphBackend {
    #[default]
    Neo4j,
    /// Graph-backed REST service (`POST /api/graph-db/triples`)
    Service,
    /// Process-local graph, nothing persisted
    Memory,
}

impl FromStr for GraphBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neo4j" => Ok(Self::Neo4j),
            "service" => Ok(Self::Service),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "unknown graph backend '{}' (expected neo4j, service or memory)",
                other
            )),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub backend: GraphBackend,
    pub uri: String,
    pub user: String,
    pub password: Option<String>,
    /// Base URL of the storage service, used by the service backend.
    pub service_url: String,
    /// Budget for each individual store call.
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: GraphBackend::Neo4j,
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: None,
            service_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GraphConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphConfig")
            .field("backend", &self.backend)
            .field("uri", &self.uri)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("service_url", &self.service_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

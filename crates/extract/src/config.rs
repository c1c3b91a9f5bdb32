use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const MIN_TIMEOUT_SECS: u64 = 30;
pub const MAX_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStrategy {
    /// Remote generation when a credential is configured, heuristic otherwise
    #[default]
    Auto,
    Remote,
    /// Local REST wrapper exposing `/api/extract-triples`
    Service,
    Heuristic,
}

impl FromStr for ExtractionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "remote" => Ok(Self::Remote),
            "service" => Ok(Self::Service),
            "heuristic" => Ok(Self::Heuristic),
            other => Err(format!(
                "unknown extraction strategy '{}' (expected auto, remote, service or heuristic)",
                other
            )),
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Auto => "auto",
            Self::Remote => "remote",
            Self::Service => "service",
            Self::Heuristic => "heuristic",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub strategy: ExtractionStrategy,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub service_url: String,
    pub timeout_secs: u64,
    /// Documents are cut to this many characters before prompting.
    pub max_input_chars: usize,
    pub temperature: f32,
    pub max_tokens: u32,
    pub auxiliary_parsing: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategy: ExtractionStrategy::Auto,
            endpoint: "https://integrate.api.nvidia.com/v1/chat/completions".to_string(),
            model: "meta/llama-3.1-70b-instruct".to_string(),
            api_key: None,
            service_url: "http://localhost:3000".to_string(),
            timeout_secs: MIN_TIMEOUT_SECS,
            max_input_chars: 2000,
            temperature: 0.2,
            max_tokens: 1024,
            auxiliary_parsing: false,
        }
    }
}

impl ExtractionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// `Auto` resolved against the configured credential.
    pub fn resolved_strategy(&self) -> ExtractionStrategy {
        match self.strategy {
            ExtractionStrategy::Auto if self.has_credential() => ExtractionStrategy::Remote,
            ExtractionStrategy::Auto => ExtractionStrategy::Heuristic,
            other => other,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("strategy", &self.strategy)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("service_url", &self.service_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_input_chars", &self.max_input_chars)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("auxiliary_parsing", &self.auxiliary_parsing)
            .finish()
    }
}

//! Runtime configuration.
//!
//! Loaded from JSON. Every field has a default, so `{}` is a valid config.
//! Durations are written the human way (`"30s"`, `"1h"`).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::providers::CompletionConfig;
use crate::resilience::{CircuitBreakerConfig, FallbackStrategy};

/// Errors loading a runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid config: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Configuration for the review runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Provider name, see [`crate::providers::PROVIDERS`]
    pub provider: String,

    /// Provider settings such as `api_key` and `base_url`
    pub provider_config: JsonValue,

    pub model: String,

    pub max_tokens: u32,

    pub temperature: f32,

    /// Deadline for one provider call, retries included
    #[serde(with = "human_duration")]
    pub narrative_timeout: Duration,

    /// Retries after the first attempt, for retryable errors only
    pub max_retries: usize,

    pub circuit_breaker: CircuitBreakerConfig,

    pub budget: BudgetConfig,

    pub cache: CacheConfig,

    /// Tried in order when the provider cannot produce a narrative
    pub fallback: Vec<FallbackStrategy>,

    /// Translate Devanagari contracts to English before analysis
    pub translate_non_english: bool,

    /// Where audit records are written; no audit log when unset
    pub audit_dir: Option<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            provider_config: JsonValue::Object(Default::default()),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 800,
            temperature: 0.2,
            narrative_timeout: Duration::from_secs(30),
            max_retries: 2,
            circuit_breaker: CircuitBreakerConfig::default(),
            budget: BudgetConfig::default(),
            cache: CacheConfig::default(),
            fallback: vec![FallbackStrategy::Cache, FallbackStrategy::Placeholder],
            translate_non_english: true,
            audit_dir: None,
        }
    }
}

impl RuntimeConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Completion settings for a provider call.
    pub fn completion_config(&self, json_mode: bool) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.narrative_timeout,
            json_mode,
        }
    }
}

/// Token budget limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Tokens allowed across all capabilities for the process lifetime
    pub global_max_tokens: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            global_max_tokens: 20_000,
        }
    }
}

/// Narrative cache sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub max_entries: u64,

    #[serde(with = "human_duration")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Serde adapter for `humantime` durations such as `"30s"` or `"1h 30m"`.
pub(crate) mod human_duration {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(D::Error::custom)
    }
}

//! Chat-completion providers.
//!
//! The runtime makes two kinds of calls, a JSON narrative and a plain-text
//! translation, both as a system prompt plus one user message. Providers
//! only need to turn that into a reply and report token usage.
//!
//! [`connect`] builds the provider named in [`RuntimeConfig::provider`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::RuntimeConfig;

mod credential;

#[cfg(feature = "openai")]
mod openai;

pub use credential::ApiKey;

#[cfg(feature = "openai")]
pub use openai::{OpenAiProvider, OPENAI_API_KEY_ENV};

/// Provider names [`connect`] understands.
#[cfg(feature = "openai")]
pub const PROVIDERS: &[&str] = &["openai"];

#[cfg(not(feature = "openai"))]
pub const PROVIDERS: &[&str] = &[];

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Authentication failed")]
    AuthError,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError(_) | Self::RateLimited { .. } | Self::Timeout(_) => true,
            Self::ApiError { status, .. } => *status >= 500,
            Self::ParseError(_) | Self::AuthError | Self::NotConfigured(_) => false,
        }
    }

    /// Delay the provider asked for before the next attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Settings for one completion request, derived from [`RuntimeConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Per-request HTTP timeout
    pub timeout: Duration,
    /// Ask for a JSON object reply
    pub json_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A provider reply.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub usage: TokenUsage,
    /// Model that actually served the call, used for cost estimates
    pub model: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    /// Prompt tokens served from the provider's prompt cache
    pub cached_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// A chat-completion backend.
///
/// Only the narrative service calls this. The core analysis never does.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    fn name(&self) -> &str;

    /// Rough prompt size used for the budget check before a call.
    fn estimate_tokens(&self, text: &str) -> u32 {
        // ~4 bytes per token
        (text.len() / 4) as u32
    }
}

/// Build the provider named by `config.provider` from `config.provider_config`.
pub fn connect(config: &RuntimeConfig) -> Result<Arc<dyn LlmProvider>, ProviderError> {
    match config.provider.as_str() {
        #[cfg(feature = "openai")]
        "openai" => Ok(Arc::new(OpenAiProvider::from_settings(
            &config.provider_config,
        )?)),
        other => Err(ProviderError::NotConfigured(format!(
            "unknown provider '{}', available: {:?}",
            other, PROVIDERS
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatMessage::system("Be brief.")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(ChatMessage::user("Hi").role, Role::User);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ProviderError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ProviderError::RateLimited { retry_after: None }.is_retryable());
        assert!(ProviderError::ApiError { status: 503, message: "busy".into() }.is_retryable());
        assert!(!ProviderError::ApiError { status: 400, message: "bad".into() }.is_retryable());
        assert!(!ProviderError::AuthError.is_retryable());
    }

    #[test]
    fn test_retry_after_only_from_rate_limit() {
        let limited = ProviderError::RateLimited {
            retry_after: Some(Duration::from_secs(7)),
        };
        assert_eq!(limited.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(ProviderError::HttpError("reset".into()).retry_after(), None);
    }

    #[test]
    fn test_connect_unknown_provider() {
        let config = RuntimeConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        match connect(&config) {
            Err(ProviderError::NotConfigured(msg)) => assert!(msg.contains("carrier-pigeon")),
            other => panic!("Expected NotConfigured, got {:?}", other.map(|p| p.name().to_string())),
        }
    }

    #[cfg(feature = "openai")]
    #[test]
    fn test_connect_openai() {
        let config = RuntimeConfig {
            provider_config: serde_json::json!({ "api_key": "sk-test" }),
            ..Default::default()
        };
        assert_eq!(connect(&config).unwrap().name(), "openai");
    }
}

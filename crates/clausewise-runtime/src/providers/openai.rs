//! OpenAI chat-completions provider.
//!
//! Settings (`provider_config`):
//!
//! ```json
//! { "api_key": "sk-...", "base_url": "https://api.openai.com/v1" }
//! ```
//!
//! Both are optional. The key falls back to `OPENAI_API_KEY`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

use super::{
    ApiKey, ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    TokenUsage,
};

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct OpenAiProvider {
    api_key: ApiKey,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OpenAiProvider {
    /// Build from `provider_config`, rejecting a missing key or a non-HTTP base URL.
    pub fn from_settings(settings: &JsonValue) -> Result<Self, ProviderError> {
        let api_key = ApiKey::resolve(settings, OPENAI_API_KEY_ENV)?;

        let base_url = settings["base_url"]
            .as_str()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ProviderError::NotConfigured(format!(
                "base_url must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        Ok(Self {
            api_key,
            base_url: base_url.to_string(),
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl<'a> ChatRequest<'a> {
    fn new(messages: &'a [ChatMessage], config: &'a CompletionConfig) -> Self {
        Self {
            model: &config.model,
            messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            response_format: config.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    model: String,
    choices: Vec<ReplyChoice>,
    #[serde(default)]
    usage: Option<ReplyUsage>,
}

#[derive(Debug, Deserialize)]
struct ReplyChoice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    #[serde(default)]
    prompt_tokens_details: Option<PromptDetails>,
}

#[derive(Debug, Deserialize)]
struct PromptDetails {
    #[serde(default)]
    cached_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl From<ReplyUsage> for TokenUsage {
    fn from(usage: ReplyUsage) -> Self {
        TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            cached_tokens: usage
                .prompt_tokens_details
                .map(|d| d.cached_tokens)
                .unwrap_or(0),
        }
    }
}

impl ChatReply {
    fn into_response(self) -> Result<CompletionResponse, ProviderError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ParseError("reply contained no choices".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: self.usage.map(TokenUsage::from).unwrap_or_default(),
            model: self.model,
        })
    }
}

/// `Retry-After` in delta-seconds form.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .timeout(config.timeout)
            .json(&ChatRequest::new(&messages, config))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else {
                    ProviderError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(ProviderError::RateLimited {
                    retry_after: retry_after(response.headers()),
                })
            }
            StatusCode::UNAUTHORIZED => return Err(ProviderError::AuthError),
            s if !s.is_success() => {
                let message = match response.json::<ErrorBody>().await {
                    Ok(body) => body.error.message,
                    Err(_) => s.canonical_reason().unwrap_or("unknown error").to_string(),
                };
                return Err(ProviderError::ApiError {
                    status: s.as_u16(),
                    message,
                });
            }
            _ => {}
        }

        response
            .json::<ChatReply>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?
            .into_response()
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn provider(settings: JsonValue) -> Result<OpenAiProvider, ProviderError> {
        OpenAiProvider::from_settings(&settings)
    }

    #[test]
    fn test_default_endpoint() {
        let provider = provider(serde_json::json!({ "api_key": "sk-test" })).unwrap();
        assert_eq!(provider.endpoint(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_base_url_trimmed_and_checked() {
        let proxied = provider(serde_json::json!({
            "api_key": "sk-test",
            "base_url": "https://proxy.internal/v1/"
        }))
        .unwrap();
        assert_eq!(proxied.endpoint(), "https://proxy.internal/v1/chat/completions");

        let invalid = provider(serde_json::json!({ "api_key": "sk-test", "base_url": "invalid-url" }));
        assert!(matches!(invalid, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn test_request_json_mode() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let config = crate::RuntimeConfig::default().completion_config(true);
        let json = serde_json::to_value(ChatRequest::new(&messages, &config)).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["response_format"]["type"], "json_object");

        let plain = crate::RuntimeConfig::default().completion_config(false);
        let json = serde_json::to_value(ChatRequest::new(&messages, &plain)).unwrap();
        assert!(json.get("response_format").is_none());
    }

    #[test]
    fn test_reply_into_response() {
        let body = r#"{
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{ "message": { "role": "assistant", "content": "{}" }, "finish_reason": "stop" }],
            "usage": { "prompt_tokens": 120, "completion_tokens": 40, "prompt_tokens_details": { "cached_tokens": 64 } }
        }"#;
        let response = serde_json::from_str::<ChatReply>(body)
            .unwrap()
            .into_response()
            .unwrap();
        assert_eq!(response.content, "{}");
        assert_eq!(response.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(response.usage.total(), 160);
        assert_eq!(response.usage.cached_tokens, 64);

        let empty: ChatReply = serde_json::from_str(r#"{ "model": "m", "choices": [] }"#).unwrap();
        assert!(matches!(empty.into_response(), Err(ProviderError::ParseError(_))));
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("20"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(20)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let secret = "sk-proj-super-secret-key-12345";
        let debug = format!("{:?}", provider(serde_json::json!({ "api_key": secret })).unwrap());
        assert!(!debug.contains(secret), "API key was exposed in Debug output!");
        assert!(debug.contains("[REDACTED]"));
    }
}

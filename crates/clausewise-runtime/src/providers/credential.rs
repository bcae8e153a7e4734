//! Provider API keys.
//!
//! Contract text is confidential and the key that ships it to a provider is
//! too. [`ApiKey`] keeps the value in a [`SecretString`] so it never shows up
//! in `Debug` output or logs; the provider reads it only when building the
//! request.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

pub struct ApiKey(SecretString);

impl ApiKey {
    /// Take `api_key` from the provider settings, else the environment variable.
    pub fn resolve(settings: &JsonValue, env_var: &str) -> Result<Self, ProviderError> {
        let value = match settings["api_key"].as_str() {
            Some(value) => value.to_string(),
            None => std::env::var(env_var).map_err(|_| {
                ProviderError::NotConfigured(format!(
                    "API key required: set 'api_key' in provider_config or {}",
                    env_var
                ))
            })?,
        };

        if value.trim().is_empty() {
            return Err(ProviderError::NotConfigured("API key is empty".to_string()));
        }
        Ok(Self(SecretString::from(value)))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

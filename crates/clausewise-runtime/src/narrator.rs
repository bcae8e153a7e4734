//! Narrative service: provider calls behind timeout, retry, circuit breaker
//! and budget, with a fallback chain that always yields a narrative.

use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::cache::NarrativeCache;
use crate::config::RuntimeConfig;
use crate::narrative::{parse_narrative, Narrative};
use crate::prompts;
use crate::providers::{ChatMessage, CompletionResponse, LlmProvider, ProviderError};
use crate::resilience::{
    unavailable_narrative, BudgetTracker, CircuitBreaker, CircuitState, FallbackStrategy,
    LlmUsage, NarrativeFallback, PlaceholderFallback,
};
use crate::{Capability, RuntimeError};

const MIN_RETRY_DELAY: Duration = Duration::from_millis(250);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(4);

/// Delay before the next attempt, or `None` to stop retrying.
///
/// A rate-limited reply waits as long as the provider asked. When that wait
/// would outlast the call deadline the error is returned right away.
fn retry_delay(
    err: &ProviderError,
    backoff: Option<Duration>,
    remaining: Duration,
) -> Option<Duration> {
    let delay = match err.retry_after() {
        Some(requested) => backoff.map(|_| requested),
        None => backoff,
    }?;
    (delay < remaining).then_some(delay)
}

/// Where a narrative came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum NarrativeSource {
    /// Fresh provider reply
    Provider,

    /// Last good narrative for this document, served after a failure
    Cache { reason: RuntimeError },

    /// Produced by the fallback chain
    Fallback {
        strategy: FallbackStrategy,
        reason: RuntimeError,
    },
}

/// A narrative plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeOutcome {
    pub narrative: Narrative,
    #[serde(flatten)]
    pub source: NarrativeSource,
}

impl NarrativeOutcome {
    /// True unless the narrative is a fresh provider reply.
    pub fn is_degraded(&self) -> bool {
        !matches!(self.source, NarrativeSource::Provider)
    }

    /// The failure that sent this narrative down the fallback chain.
    pub fn failure(&self) -> Option<&RuntimeError> {
        match &self.source {
            NarrativeSource::Provider => None,
            NarrativeSource::Cache { reason } | NarrativeSource::Fallback { reason, .. } => {
                Some(reason)
            }
        }
    }
}

/// Produces narratives and translations through an optional provider.
///
/// Circuit, budget and cache state live as long as the service, so one
/// service should be shared across all reviews of a run.
pub struct NarrativeService {
    provider: Option<Arc<dyn LlmProvider>>,
    config: RuntimeConfig,
    circuit_breaker: CircuitBreaker,
    budget: BudgetTracker,
    cache: NarrativeCache,
    placeholder: Arc<dyn NarrativeFallback>,
}

impl NarrativeService {
    pub fn new(provider: Option<Arc<dyn LlmProvider>>, config: RuntimeConfig) -> Self {
        Self {
            provider,
            circuit_breaker: CircuitBreaker::new(config.circuit_breaker.clone()),
            budget: BudgetTracker::new(config.budget.global_max_tokens),
            cache: NarrativeCache::from_config(&config.cache),
            placeholder: Arc::new(PlaceholderFallback),
            config,
        }
    }

    /// Replace the narrative used by the `placeholder` strategy.
    pub fn with_fallback(mut self, fallback: Arc<dyn NarrativeFallback>) -> Self {
        self.placeholder = fallback;
        self
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Narrate a contract. Never fails.
    pub async fn narrate(&self, contract_text: &str, fingerprint: &str) -> NarrativeOutcome {
        let reply = self
            .complete(
                Capability::Narrative,
                prompts::narrative_messages(contract_text),
                true,
            )
            .await;

        match reply.and_then(|response| Ok(parse_narrative(&response.content)?)) {
            Ok(narrative) => {
                self.cache.insert(fingerprint, narrative.clone()).await;
                NarrativeOutcome {
                    narrative,
                    source: NarrativeSource::Provider,
                }
            }
            Err(reason) => {
                tracing::warn!(%fingerprint, %reason, "Narrative unavailable, using fallback chain");
                self.fallback(fingerprint, reason).await
            }
        }
    }

    /// Translate a contract to English.
    pub async fn translate(&self, contract_text: &str) -> Result<String, RuntimeError> {
        let response = self
            .complete(
                Capability::Translation,
                prompts::translation_messages(contract_text),
                false,
            )
            .await?;

        let translated = response.content.trim();
        if translated.is_empty() {
            return Err(RuntimeError::MalformedReply("empty translation".to_string()));
        }
        Ok(translated.to_string())
    }

    async fn fallback(&self, fingerprint: &str, reason: RuntimeError) -> NarrativeOutcome {
        for strategy in &self.config.fallback {
            match strategy {
                FallbackStrategy::Cache => {
                    if let Some(narrative) = self.cache.get(fingerprint).await {
                        tracing::info!(%fingerprint, "Serving cached narrative");
                        return NarrativeOutcome {
                            narrative,
                            source: NarrativeSource::Cache { reason },
                        };
                    }
                }
                FallbackStrategy::Placeholder => {
                    if let Some(narrative) = self.placeholder.narrative(&reason) {
                        tracing::debug!(fallback = self.placeholder.name(), "Serving placeholder narrative");
                        return NarrativeOutcome {
                            narrative,
                            source: NarrativeSource::Fallback {
                                strategy: FallbackStrategy::Placeholder,
                                reason,
                            },
                        };
                    }
                }
                FallbackStrategy::Unavailable => break,
            }
        }

        NarrativeOutcome {
            narrative: unavailable_narrative(&reason),
            source: NarrativeSource::Fallback {
                strategy: FallbackStrategy::Unavailable,
                reason,
            },
        }
    }

    /// One guarded provider call: circuit, budget, timeout, retry.
    async fn complete(
        &self,
        capability: Capability,
        messages: Vec<ChatMessage>,
        json_mode: bool,
    ) -> Result<CompletionResponse, RuntimeError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or(RuntimeError::ProviderNotConfigured)?;

        if self.circuit_breaker.is_open(capability) {
            return Err(RuntimeError::CircuitOpen(capability));
        }

        let prompt_tokens: u32 = messages
            .iter()
            .map(|m| provider.estimate_tokens(&m.content))
            .sum();
        let estimated = prompt_tokens.saturating_add(self.config.max_tokens);
        if !self.budget.can_afford(capability, estimated) {
            tracing::warn!(
                %capability,
                estimated,
                remaining = self.budget.remaining_global(),
                "Token budget exhausted"
            );
            return Err(RuntimeError::BudgetExceeded(capability));
        }

        let completion = self.config.completion_config(json_mode);
        let backoff = ExponentialBuilder::default()
            .with_min_delay(MIN_RETRY_DELAY)
            .with_max_delay(MAX_RETRY_DELAY)
            .with_max_times(self.config.max_retries);

        let timeout = self.config.narrative_timeout;
        let deadline = Instant::now() + timeout;

        let (messages, completion) = (&messages, &completion);
        let call = || async move { provider.complete(messages.clone(), completion).await };
        let attempt = call
            .retry(backoff)
            .sleep(tokio::time::sleep)
            .when(ProviderError::is_retryable)
            .adjust(|err: &ProviderError, delay: Option<Duration>| {
                retry_delay(err, delay, deadline.saturating_duration_since(Instant::now()))
            })
            .notify(|err: &ProviderError, delay: Duration| {
                tracing::debug!(%capability, error = %err, ?delay, "Retrying provider call");
            });

        match tokio::time::timeout(timeout, attempt).await {
            Ok(Ok(response)) => {
                self.circuit_breaker.record_success(capability);
                self.budget
                    .record_usage(capability, &response.usage, &response.model);
                tracing::debug!(
                    %capability,
                    provider = provider.name(),
                    tokens = response.usage.total(),
                    "Provider call succeeded"
                );
                Ok(response)
            }
            Ok(Err(err)) => {
                self.circuit_breaker.record_failure(capability);
                Err(err.into())
            }
            Err(_) => {
                self.circuit_breaker.record_failure(capability);
                Err(RuntimeError::Timeout(
                    humantime::format_duration(timeout).to_string(),
                ))
            }
        }
    }

    /// Accumulated provider usage.
    pub fn usage(&self) -> LlmUsage {
        self.budget.get_usage()
    }

    pub fn circuit_state(&self, capability: Capability) -> CircuitState {
        self.circuit_breaker.state(capability)
    }

    pub fn cache(&self) -> &NarrativeCache {
        &self.cache
    }
}

//! Circuit breaker to prevent cascade failures.
//!
//! When provider calls fail repeatedly, the circuit opens and
//! subsequent calls go straight to the fallback chain.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::human_duration;
use crate::Capability;

/// Circuit breaker configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Failures before opening circuit
    pub failure_threshold: u32,

    /// Time before attempting recovery
    #[serde(with = "human_duration")]
    pub recovery_timeout: Duration,

    /// Successes needed to close circuit
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// Circuit is open, all calls bypass
    Open { opened_at: Instant },

    /// Testing if circuit can close
    HalfOpen { successes: u32 },
}

/// Circuit breaker prevents cascade failures.
///
/// Each capability has its own circuit, so a failing translation endpoint
/// does not stop narratives.
pub struct CircuitBreaker {
    states: RwLock<HashMap<Capability, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Check if circuit is open for a capability.
    ///
    /// Returns true if calls should bypass the provider and use fallback.
    pub fn is_open(&self, capability: Capability) -> bool {
        let states = self.states.read();
        match states.get(&capability) {
            Some(CircuitState::Open { opened_at }) => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    drop(states);
                    self.transition_to_half_open(capability);
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    /// Record a successful provider call.
    pub fn record_success(&self, capability: Capability) {
        let mut states = self.states.write();
        match states.get(&capability).cloned() {
            Some(CircuitState::HalfOpen { successes }) => {
                if successes + 1 >= self.config.success_threshold {
                    states.insert(capability, CircuitState::Closed { failures: 0 });
                    tracing::info!(%capability, "Circuit closed after successful recovery");
                } else {
                    states.insert(
                        capability,
                        CircuitState::HalfOpen {
                            successes: successes + 1,
                        },
                    );
                }
            }
            Some(CircuitState::Closed { .. }) => {
                states.insert(capability, CircuitState::Closed { failures: 0 });
            }
            _ => {}
        }
    }

    /// Record a failed provider call.
    pub fn record_failure(&self, capability: Capability) {
        let mut states = self.states.write();
        let failures = match states.get(&capability).cloned() {
            None => 0,
            Some(CircuitState::Closed { failures }) => failures,
            Some(CircuitState::HalfOpen { .. }) => {
                // Failed during recovery, reopen
                states.insert(
                    capability,
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    },
                );
                tracing::warn!(%capability, "Circuit reopened after failed recovery attempt");
                return;
            }
            Some(CircuitState::Open { .. }) => return,
        };

        if failures + 1 >= self.config.failure_threshold {
            states.insert(
                capability,
                CircuitState::Open {
                    opened_at: Instant::now(),
                },
            );
            tracing::warn!(
                %capability,
                failures = failures + 1,
                "Circuit opened after repeated failures"
            );
        } else {
            states.insert(
                capability,
                CircuitState::Closed {
                    failures: failures + 1,
                },
            );
        }
    }

    fn transition_to_half_open(&self, capability: Capability) {
        let mut states = self.states.write();
        if matches!(states.get(&capability), Some(CircuitState::Open { .. })) {
            states.insert(capability, CircuitState::HalfOpen { successes: 0 });
            tracing::info!(%capability, "Circuit transitioning to half-open for recovery test");
        }
    }

    /// Get current state of a circuit.
    pub fn state(&self, capability: Capability) -> CircuitState {
        self.states
            .read()
            .get(&capability)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_starts_closed() {
        let cb = CircuitBreaker::default();
        assert!(!cb.is_open(Capability::Narrative));
        assert_eq!(cb.state(Capability::Narrative), CircuitState::Closed { failures: 0 });
    }

    #[test]
    fn test_circuit_opens_after_failures() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            ..Default::default()
        });

        cb.record_failure(Capability::Narrative);
        assert!(!cb.is_open(Capability::Narrative));

        cb.record_failure(Capability::Narrative);
        assert!(cb.is_open(Capability::Narrative));
    }

    #[test]
    fn test_single_failure_threshold_opens_immediately() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            ..Default::default()
        });

        cb.record_failure(Capability::Narrative);
        assert!(cb.is_open(Capability::Narrative));
    }

    #[test]
    fn test_success_resets_failures() {
        let cb = CircuitBreaker::default();

        cb.record_failure(Capability::Narrative);
        cb.record_failure(Capability::Narrative);
        cb.record_success(Capability::Narrative);

        cb.record_failure(Capability::Narrative);
        cb.record_failure(Capability::Narrative);
        assert!(!cb.is_open(Capability::Narrative));
    }

    #[test]
    fn test_capabilities_are_independent() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            ..Default::default()
        });

        cb.record_failure(Capability::Translation);
        cb.record_failure(Capability::Translation);

        assert!(cb.is_open(Capability::Translation));
        assert!(!cb.is_open(Capability::Narrative));
    }

    #[test]
    fn test_recovery_through_half_open() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::ZERO,
            success_threshold: 2,
        });

        cb.record_failure(Capability::Narrative);
        // Zero recovery timeout: the next check moves straight to half-open
        assert!(!cb.is_open(Capability::Narrative));
        assert_eq!(cb.state(Capability::Narrative), CircuitState::HalfOpen { successes: 0 });

        cb.record_success(Capability::Narrative);
        assert_eq!(cb.state(Capability::Narrative), CircuitState::HalfOpen { successes: 1 });

        cb.record_success(Capability::Narrative);
        assert_eq!(cb.state(Capability::Narrative), CircuitState::Closed { failures: 0 });
    }

    #[test]
    fn test_failure_in_half_open_reopens() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 1,
            recovery_timeout: Duration::ZERO,
            success_threshold: 2,
        });

        cb.record_failure(Capability::Narrative);
        assert!(!cb.is_open(Capability::Narrative));
        cb.record_failure(Capability::Narrative);
        assert!(matches!(cb.state(Capability::Narrative), CircuitState::Open { .. }));
    }
}

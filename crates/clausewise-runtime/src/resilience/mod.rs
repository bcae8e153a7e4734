//! Resilience patterns for clausewise-runtime.
//!
//! This module provides:
//! - Circuit breaker per capability
//! - Token budget management
//! - Fallback narratives

mod budget;
mod circuit_breaker;
mod fallback;

pub use budget::{BudgetTracker, LlmUsage, TokenBudget};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use fallback::{
    placeholder_narrative, unavailable_narrative, FallbackStrategy, NarrativeFallback,
    PlaceholderFallback,
};

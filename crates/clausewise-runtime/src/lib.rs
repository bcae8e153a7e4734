//! # clausewise-runtime
//!
//! Collaborators around the deterministic clause analysis in
//! `clausewise-core`: the AI narrative, translation pre-processing, audit
//! log storage and report rendering.
//!
//! ## Important
//!
//! Nothing here changes what `clausewise-core` computes. Clauses, categories,
//! risk tiers and fingerprints come from the core alone. The runtime only
//! adds prose around them, and every collaborator degrades instead of
//! failing: a review always completes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use clausewise_runtime::{ReviewOrchestrator, RuntimeConfig};
//!
//! let orchestrator = ReviewOrchestrator::builder()
//!     .config(RuntimeConfig::default())
//!     .build()
//!     .await;
//!
//! let review = orchestrator.review("msa.txt", &text).await;
//! println!("{}", review.narrative.narrative.summary);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod audit_log;
pub mod cache;
pub mod config;
pub mod language;
pub mod narrative;
pub mod narrator;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod report;
pub mod resilience;

pub use audit_log::{AuditError, AuditLog};
pub use cache::NarrativeCache;
pub use config::RuntimeConfig;
pub use language::{detect_script, Script};
pub use narrative::{parse_narrative, Narrative, NarrativeParseError};
pub use narrator::{NarrativeOutcome, NarrativeService, NarrativeSource};
pub use orchestrator::{ContractReview, ReviewOrchestrator, ReviewOrchestratorBuilder};
pub use providers::{connect, LlmProvider, ProviderError};
pub use report::{ReportError, ReportRenderer};
pub use resilience::{FallbackStrategy, LlmUsage, NarrativeFallback};

/// A provider-backed capability with its own circuit and budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Summary, risks and suggestions for a contract
    Narrative,
    /// Translation of non-English contracts to English
    Translation,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::Narrative, Capability::Translation];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Narrative => "narrative",
            Capability::Translation => "translation",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a provider-backed call did not produce a usable result.
///
/// These never escape a review. They are recorded as the fallback reason.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum RuntimeError {
    #[error("no provider configured")]
    ProviderNotConfigured,

    #[error("circuit open for {0}")]
    CircuitOpen(Capability),

    #[error("token budget exhausted for {0}")]
    BudgetExceeded(Capability),

    #[error("timed out after {0}")]
    Timeout(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("malformed reply: {0}")]
    MalformedReply(String),
}

impl From<ProviderError> for RuntimeError {
    fn from(err: ProviderError) -> Self {
        RuntimeError::Provider(err.to_string())
    }
}

impl From<NarrativeParseError> for RuntimeError {
    fn from(err: NarrativeParseError) -> Self {
        RuntimeError::MalformedReply(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_capability_names() {
        assert_eq!(Capability::Narrative.to_string(), "narrative");
        assert_eq!(
            serde_json::to_value(Capability::Translation).unwrap(),
            "translation"
        );
    }

    #[test]
    fn test_runtime_error_from_provider() {
        let err: RuntimeError = ProviderError::Timeout(Duration::from_secs(3)).into();
        assert!(matches!(err, RuntimeError::Provider(ref msg) if msg.contains("Timeout")));
    }

    #[test]
    fn test_runtime_error_serializes_tagged() {
        let json = serde_json::to_value(RuntimeError::CircuitOpen(Capability::Narrative)).unwrap();
        assert_eq!(json["kind"], "circuit_open");
        assert_eq!(json["detail"], "narrative");
    }
}

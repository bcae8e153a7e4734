//! Fallback strategies when the provider cannot produce a narrative.

use serde::{Deserialize, Serialize};

use crate::narrative::Narrative;
use crate::RuntimeError;

/// One step of the fallback chain, tried in configured order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    /// Last good narrative for the same document fingerprint
    Cache,

    /// The fixed placeholder narrative, or an injected [`NarrativeFallback`]
    Placeholder,

    /// A narrative that states the failure reason
    Unavailable,
}

/// Produces a narrative when the provider could not.
///
/// Returning `None` moves on to the next strategy in the chain.
pub trait NarrativeFallback: Send + Sync {
    fn name(&self) -> &str;

    fn narrative(&self, reason: &RuntimeError) -> Option<Narrative>;
}

/// The stock placeholder narrative.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderFallback;

impl NarrativeFallback for PlaceholderFallback {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn narrative(&self, _reason: &RuntimeError) -> Option<Narrative> {
        Some(placeholder_narrative())
    }
}

pub fn placeholder_narrative() -> Narrative {
    Narrative {
        summary: "Mock summary: contract overview.".to_string(),
        risks: "Mock risks: payment delays, confidentiality issues, termination clauses."
            .to_string(),
        suggestions:
            "Mock suggestions: include penalties, enforce NDA, clarify payment schedule."
                .to_string(),
    }
}

/// Terminal fallback. Always well-formed.
pub fn unavailable_narrative(reason: &RuntimeError) -> Narrative {
    Narrative {
        summary: format!("AI analysis unavailable ({}).", reason),
        risks: "Review the clause risk tiers above; no AI risk narrative was produced."
            .to_string(),
        suggestions: "Retry the review later or consult counsel for a manual assessment."
            .to_string(),
    }
}

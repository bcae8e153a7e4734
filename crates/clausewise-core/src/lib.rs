//! # clausewise-core
//!
//! Deterministic contract clause analysis.
//!
//! This crate turns raw contract text into an ordered list of clauses, each
//! labelled with a category and a risk tier, plus a content fingerprint for
//! audit correlation.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same text always produces the same result
//! 2. **Total**: Every string, including the empty one, yields a valid result
//! 3. **No I/O**: No network or LLM calls; policy files are only read on request
//! 4. **Traceable**: Every label can be explained by the trigger that fired
//!
//! ## Example
//!
//! ```rust
//! use clausewise_core::{analyze, Category, RiskLevel};
//!
//! let result = analyze("Parties: Acme and Beta\n1. A late fee applies.\n2. Notices in writing.");
//!
//! assert_eq!(result.clauses.len(), 2);
//! assert_eq!(result.clauses[0].category, Category::Penalty);
//! assert_eq!(result.risk_summary, vec![RiskLevel::Low, RiskLevel::Low]);
//! ```

pub mod analyzer;
pub mod audit;
pub mod classifier;
pub mod evidence;
pub mod fingerprint;
mod matcher;
pub mod policy;
pub mod risk;
pub mod segmenter;
pub mod types;

// Re-export main types at crate root
pub use analyzer::{Analyzer, ClauseExplanation};
pub use audit::AuditRecord;
pub use classifier::ClauseClassifier;
pub use evidence::{Evidence, EvidenceKind};
pub use fingerprint::fingerprint;
pub use matcher::TriggerMatch;
pub use policy::{CategoryRule, Policy, PolicyError, RiskRule};
pub use risk::RiskScorer;
pub use segmenter::{segment, split_clauses, Segmentation};
pub use types::{AnalysisResult, Category, ClauseRecord, RiskLevel};

use lazy_static::lazy_static;

lazy_static! {
    static ref DEFAULT_ANALYZER: Analyzer = Analyzer::new();
}

/// Analyze contract text with the built-in keyword tables.
///
/// This is the main entry point for clause analysis.
///
/// # Returns
///
/// An `AnalysisResult` containing:
/// - `clauses`: one record per clause, ids 1..=n in document order
/// - `document_fingerprint`: SHA-256 of the raw text
/// - `risk_summary`: each clause's tier, parallel to `clauses`
/// - `preamble`: text before the first numbered clause, if any
pub fn analyze(document_text: &str) -> AnalysisResult {
    DEFAULT_ANALYZER.analyze(document_text)
}

/// Classify a single clause with the built-in table.
pub fn classify_clause(clause: &str) -> Category {
    DEFAULT_ANALYZER.classifier().classify(clause)
}

/// Score a single clause with the built-in table.
pub fn score_risk(clause: &str) -> RiskLevel {
    DEFAULT_ANALYZER.scorer().score(clause)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_analysis() {
        let result = analyze("Intro text\n1. First clause.\n2. Second clause.");

        assert_eq!(result.clauses.len(), 2);
        assert_eq!(result.clauses[0].text, "First clause.");
        assert_eq!(result.clauses[1].text, "Second clause.");
        assert_eq!(result.clauses[0].id, 1);
        assert_eq!(result.clauses[1].id, 2);
    }

    #[test]
    fn test_default_fallback() {
        assert_eq!(classify_clause("Nothing to see."), Category::Other);
        assert_eq!(score_risk("Nothing to see."), RiskLevel::Low);
    }

    #[test]
    fn test_precedence_through_public_api() {
        assert_eq!(
            classify_clause("Termination requires payment of dues."),
            Category::Termination
        );
        assert_eq!(
            score_risk("A penalty and automatic renewal both apply."),
            RiskLevel::High
        );
    }
}

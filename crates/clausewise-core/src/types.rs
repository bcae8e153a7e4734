//! Core types for clause analysis.
//!
//! These are the data structures produced by a single analysis pass and
//! handed to the narrative, audit and report collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic bucket assigned to a clause.
///
/// Variant order is the classification precedence: when a clause matches
/// triggers of several categories, the earliest one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Termination,
    Payment,
    Confidentiality,
    Penalty,
    Other,
}

impl Category {
    /// Every category, in precedence order, `Other` last.
    pub const ALL: [Category; 5] = [
        Category::Termination,
        Category::Payment,
        Category::Confidentiality,
        Category::Penalty,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Termination => "Termination",
            Self::Payment => "Payment",
            Self::Confidentiality => "Confidentiality",
            Self::Penalty => "Penalty",
            Self::Other => "Other",
        }
    }

    /// Whether this is the label assigned when nothing matches.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity tier assigned to a clause.
///
/// Ordered `Low < Medium < High`, so `max()` over a document yields its
/// worst clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Tiers in the order they are tested: `High`, then `Medium`, then `Low`.
    pub const BY_PRECEDENCE: [RiskLevel; 3] = [RiskLevel::High, RiskLevel::Medium, RiskLevel::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Whether this is the tier assigned when nothing matches.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Low)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseRecord {
    /// 1-based position within the document
    pub id: usize,

    /// Verbatim clause content, trimmed
    pub text: String,

    /// Semantic bucket
    pub category: Category,

    /// Severity tier
    pub risk: RiskLevel,
}

/// The output of one document's analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Clauses in document order
    pub clauses: Vec<ClauseRecord>,

    /// SHA-256 of the raw input text, lowercase hex
    pub document_fingerprint: String,

    /// Each clause's risk tier, parallel to `clauses`
    pub risk_summary: Vec<RiskLevel>,

    /// Text preceding the first numbered marker, if any.
    ///
    /// Never counted as a clause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
}

impl AnalysisResult {
    /// Number of clauses detected.
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// True when no clauses were detected.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// The worst tier across all clauses, `None` for an empty document.
    pub fn highest_risk(&self) -> Option<RiskLevel> {
        self.risk_summary.iter().copied().max()
    }

    /// How many clauses carry the given tier.
    pub fn count_by_risk(&self, level: RiskLevel) -> usize {
        self.risk_summary.iter().filter(|r| **r == level).count()
    }

    /// How many clauses carry the given category.
    pub fn count_by_category(&self, category: Category) -> usize {
        self.clauses.iter().filter(|c| c.category == category).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: usize, category: Category, risk: RiskLevel) -> ClauseRecord {
        ClauseRecord {
            id,
            text: format!("clause {}", id),
            category,
            risk,
        }
    }

    #[test]
    fn test_risk_ordering() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
        assert_eq!(RiskLevel::BY_PRECEDENCE[0], RiskLevel::High);
    }

    #[test]
    fn test_labels_serialize_as_display_names() {
        assert_eq!(serde_json::to_string(&Category::Confidentiality).unwrap(), "\"Confidentiality\"");
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"Medium\"");
        assert_eq!(Category::Penalty.to_string(), "Penalty");
    }

    #[test]
    fn test_result_accessors() {
        let result = AnalysisResult {
            clauses: vec![
                record(1, Category::Payment, RiskLevel::Low),
                record(2, Category::Penalty, RiskLevel::High),
                record(3, Category::Payment, RiskLevel::Medium),
            ],
            document_fingerprint: "ab".to_string(),
            risk_summary: vec![RiskLevel::Low, RiskLevel::High, RiskLevel::Medium],
            preamble: None,
        };

        assert_eq!(result.len(), 3);
        assert_eq!(result.highest_risk(), Some(RiskLevel::High));
        assert_eq!(result.count_by_risk(RiskLevel::Low), 1);
        assert_eq!(result.count_by_category(Category::Payment), 2);
    }

    #[test]
    fn test_empty_result_has_no_highest_risk() {
        let result = AnalysisResult {
            clauses: vec![],
            document_fingerprint: String::new(),
            risk_summary: vec![],
            preamble: None,
        };
        assert!(result.is_empty());
        assert_eq!(result.highest_risk(), None);
    }

    #[test]
    fn test_preamble_omitted_when_absent() {
        let result = AnalysisResult {
            clauses: vec![],
            document_fingerprint: "00".to_string(),
            risk_summary: vec![],
            preamble: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("preamble").is_none());
    }
}

//! Clause classification.
//!
//! Assigns exactly one [`Category`] per clause by keyword precedence:
//! Termination, Payment, Confidentiality, Penalty. A clause can textually
//! satisfy several categories; the earliest one in the table wins. No match
//! means `Other`.

use lazy_static::lazy_static;

use crate::matcher::{RuleTable, TriggerMatch};
use crate::policy::{Policy, PolicyError};
use crate::types::Category;

lazy_static! {
    static ref DEFAULT_TABLE: RuleTable<Category> = compile(&Policy::default()).unwrap();
}

/// Keyword classifier over an ordered category table.
#[derive(Debug, Clone)]
pub struct ClauseClassifier {
    table: RuleTable<Category>,
}

impl ClauseClassifier {
    /// Classifier using the built-in table.
    pub fn new() -> Self {
        Self {
            table: DEFAULT_TABLE.clone(),
        }
    }

    /// Classifier using a custom policy's category rules.
    pub fn from_policy(policy: &Policy) -> Result<Self, PolicyError> {
        Ok(Self {
            table: compile(policy)?,
        })
    }

    /// Classify a clause. Never fails; defaults to `Other`.
    pub fn classify(&self, clause: &str) -> Category {
        self.table
            .first_match(clause)
            .map(|m| m.label)
            .unwrap_or(Category::Other)
    }

    /// Classify and report which trigger decided, if any.
    pub fn explain(&self, clause: &str) -> (Category, Option<TriggerMatch<Category>>) {
        match self.table.first_match(clause) {
            Some(m) => (m.label, Some(m)),
            None => (Category::Other, None),
        }
    }

    /// Categories in the order they are tested.
    pub fn precedence(&self) -> Vec<Category> {
        self.table.labels().collect()
    }
}

impl Default for ClauseClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(policy: &Policy) -> Result<RuleTable<Category>, PolicyError> {
    RuleTable::compile(
        policy
            .categories
            .iter()
            .map(|r| (r.category, r.triggers.as_slice())),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::CategoryRule;

    #[test]
    fn test_each_builtin_category() {
        let c = ClauseClassifier::new();
        assert_eq!(c.classify("Either party may terminate this Agreement."), Category::Termination);
        assert_eq!(c.classify("The Client shall pay within 30 days."), Category::Payment);
        assert_eq!(c.classify("All amounts are in INR."), Category::Payment);
        assert_eq!(c.classify("This information is confidential."), Category::Confidentiality);
        assert_eq!(c.classify("A late fee of 2% applies."), Category::Penalty);
    }

    #[test]
    fn test_termination_beats_payment() {
        let c = ClauseClassifier::new();
        let clause = "Upon termination, the Client shall pay all outstanding invoices.";
        assert_eq!(c.classify(clause), Category::Termination);
    }

    #[test]
    fn test_payment_beats_penalty() {
        let c = ClauseClassifier::new();
        assert_eq!(c.classify("Late payment incurs a penalty."), Category::Payment);
    }

    #[test]
    fn test_case_insensitive() {
        let c = ClauseClassifier::new();
        assert_eq!(c.classify("TERMINATION NOTICE"), c.classify("termination notice"));
        assert_eq!(c.classify("inr 5,000"), Category::Payment);
    }

    #[test]
    fn test_substring_semantics() {
        // "nda" is matched inside "calendar"; literal substring matching is the rule
        let c = ClauseClassifier::new();
        assert_eq!(c.classify("Meetings follow the shared calendar."), Category::Confidentiality);
    }

    #[test]
    fn test_default_is_other() {
        let c = ClauseClassifier::new();
        assert_eq!(c.classify("This Agreement is governed by the laws of India."), Category::Other);
        assert_eq!(c.classify(""), Category::Other);
    }

    #[test]
    fn test_explain_reports_trigger() {
        let c = ClauseClassifier::new();
        let (category, m) = c.explain("Provide a notice period of 30 days.");
        assert_eq!(category, Category::Termination);
        let m = m.unwrap();
        assert_eq!(m.trigger, "notice period");
        assert_eq!(m.start, 10);

        let (category, m) = c.explain("Miscellaneous.");
        assert_eq!(category, Category::Other);
        assert!(m.is_none());
    }

    #[test]
    fn test_custom_policy_reorders_precedence() {
        let mut policy = Policy::default();
        policy.categories = vec![
            CategoryRule {
                category: Category::Payment,
                triggers: vec!["invoice".to_string()],
            },
            CategoryRule {
                category: Category::Termination,
                triggers: vec!["termination".to_string()],
            },
        ];
        let c = ClauseClassifier::from_policy(&policy).unwrap();
        assert_eq!(c.precedence(), vec![Category::Payment, Category::Termination]);
        assert_eq!(c.classify("On termination, send a final invoice."), Category::Payment);
    }
}

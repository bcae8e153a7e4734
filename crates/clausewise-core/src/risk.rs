//! Risk scoring.
//!
//! Tiers are tested High, then Medium; the first tier with a matching
//! phrase wins. Nothing matching means `Low`.

use lazy_static::lazy_static;

use crate::matcher::{RuleTable, TriggerMatch};
use crate::policy::{Policy, PolicyError};
use crate::types::RiskLevel;

lazy_static! {
    static ref DEFAULT_TABLE: RuleTable<RiskLevel> = compile(&Policy::default()).unwrap();
}

/// Keyword risk scorer over an ordered tier table.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    table: RuleTable<RiskLevel>,
}

impl RiskScorer {
    pub fn new() -> Self {
        Self {
            table: DEFAULT_TABLE.clone(),
        }
    }

    pub fn from_policy(policy: &Policy) -> Result<Self, PolicyError> {
        Ok(Self {
            table: compile(policy)?,
        })
    }

    /// Score a clause. Never fails; defaults to `Low`.
    pub fn score(&self, clause: &str) -> RiskLevel {
        self.table
            .first_match(clause)
            .map(|m| m.label)
            .unwrap_or(RiskLevel::Low)
    }

    /// Score and report which trigger decided, if any.
    pub fn explain(&self, clause: &str) -> (RiskLevel, Option<TriggerMatch<RiskLevel>>) {
        match self.table.first_match(clause) {
            Some(m) => (m.label, Some(m)),
            None => (RiskLevel::Low, None),
        }
    }
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn compile(policy: &Policy) -> Result<RuleTable<RiskLevel>, PolicyError> {
    RuleTable::compile(policy.risks.iter().map(|r| (r.level, r.triggers.as_slice())))
}

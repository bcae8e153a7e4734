//! Evidence linking for clause labels.
//!
//! Every label assigned by a trigger can point to the exact span of the
//! clause that fired it. Fallback labels carry evidence with no span.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::matcher::TriggerMatch;

/// Which decision a piece of evidence supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    Category,
    Risk,
}

/// A piece of evidence supporting a clause label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evidence {
    /// What this evidence supports
    pub claim: String,

    /// Category or risk decision
    pub kind: EvidenceKind,

    /// The trigger phrase that fired, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<String>,

    /// Pointer to the location (e.g., "clauses[3][10:23]")
    pub pointer: String,
}

impl Evidence {
    /// Evidence from a trigger hit inside a clause.
    pub fn from_trigger<L: fmt::Display>(
        kind: EvidenceKind,
        clause_id: usize,
        m: &TriggerMatch<L>,
    ) -> Self {
        Self {
            claim: format!("{} matched trigger '{}'", m.label, m.trigger),
            kind,
            trigger: Some(m.trigger.clone()),
            pointer: format!("clauses[{}][{}:{}]", clause_id, m.start, m.end),
        }
    }

    /// Evidence for a label assigned because nothing matched.
    pub fn fallback(kind: EvidenceKind, clause_id: usize, label: impl fmt::Display) -> Self {
        Self {
            claim: format!("{} assigned by default, no trigger matched", label),
            kind,
            trigger: None,
            pointer: format!("clauses[{}]", clause_id),
        }
    }
}

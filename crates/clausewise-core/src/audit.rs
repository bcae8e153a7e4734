//! Audit record shape.
//!
//! The core does not store anything. It builds the record an audit
//! collaborator persists: which file, its fingerprint, and the ordered
//! risk tiers found in it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AnalysisResult, RiskLevel};

/// One audit entry for an analyzed document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    /// When the record was created
    pub timestamp: DateTime<Utc>,

    /// Name of the uploaded file
    pub file_name: String,

    /// Fingerprint of the analyzed text
    pub file_hash: String,

    /// Risk tier per clause, in document order
    pub risk_score: Vec<RiskLevel>,
}

impl AuditRecord {
    /// Build a record for an analysis, stamped now.
    pub fn new(file_name: impl Into<String>, result: &AnalysisResult) -> Self {
        Self::at(file_name, result, Utc::now())
    }

    /// Build a record with an explicit timestamp.
    pub fn at(file_name: impl Into<String>, result: &AnalysisResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            file_name: file_name.into(),
            file_hash: result.document_fingerprint.clone(),
            risk_score: result.risk_summary.clone(),
        }
    }
}

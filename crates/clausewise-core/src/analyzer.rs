//! Analyzer: runs segmentation, classification and scoring over a document.
//!
//! The pass is a pure function of its input:
//! 1. Fingerprint the raw text
//! 2. Segment it once
//! 3. Classify and score each clause in document order, ids from 1
//! 4. Assemble the clauses and the parallel risk summary

use serde::{Deserialize, Serialize};

use crate::classifier::ClauseClassifier;
use crate::evidence::{Evidence, EvidenceKind};
use crate::fingerprint::fingerprint;
use crate::policy::{Policy, PolicyError};
use crate::risk::RiskScorer;
use crate::segmenter::segment;
use crate::types::{AnalysisResult, ClauseRecord};

/// A clause together with the evidence behind its labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseExplanation {
    pub clause: ClauseRecord,

    /// Category evidence first, then risk evidence
    pub evidence: Vec<Evidence>,
}

/// The Analyzer turns contract text into an [`AnalysisResult`].
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    classifier: ClauseClassifier,
    scorer: RiskScorer,
}

impl Analyzer {
    /// Analyzer with the built-in keyword tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer with custom keyword tables.
    pub fn with_policy(policy: &Policy) -> Result<Self, PolicyError> {
        Ok(Self {
            classifier: ClauseClassifier::from_policy(policy)?,
            scorer: RiskScorer::from_policy(policy)?,
        })
    }

    pub fn classifier(&self) -> &ClauseClassifier {
        &self.classifier
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    /// Analyze a whole document.
    ///
    /// Total over all inputs: the empty string yields an empty clause list.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        let document_fingerprint = fingerprint(text);
        let segmentation = segment(text);

        let clauses: Vec<ClauseRecord> = segmentation
            .clauses
            .into_iter()
            .enumerate()
            .map(|(index, clause)| ClauseRecord {
                id: index + 1,
                category: self.classifier.classify(&clause),
                risk: self.scorer.score(&clause),
                text: clause,
            })
            .collect();

        let risk_summary = clauses.iter().map(|c| c.risk).collect();

        tracing::debug!(
            fingerprint = %document_fingerprint,
            clauses = clauses.len(),
            has_preamble = segmentation.preamble.is_some(),
            "Document analyzed"
        );

        AnalysisResult {
            clauses,
            document_fingerprint,
            risk_summary,
            preamble: segmentation.preamble,
        }
    }

    /// Analyze and attach per-clause evidence for each label.
    pub fn explain(&self, text: &str) -> Vec<ClauseExplanation> {
        segment(text)
            .clauses
            .into_iter()
            .enumerate()
            .map(|(index, text)| {
                let id = index + 1;
                let (category, category_match) = self.classifier.explain(&text);
                let (risk, risk_match) = self.scorer.explain(&text);

                let evidence = vec![
                    match category_match {
                        Some(m) => Evidence::from_trigger(EvidenceKind::Category, id, &m),
                        None => Evidence::fallback(EvidenceKind::Category, id, category),
                    },
                    match risk_match {
                        Some(m) => Evidence::from_trigger(EvidenceKind::Risk, id, &m),
                        None => Evidence::fallback(EvidenceKind::Risk, id, risk),
                    },
                ];

                ClauseExplanation {
                    clause: ClauseRecord {
                        id,
                        text,
                        category,
                        risk,
                    },
                    evidence,
                }
            })
            .collect()
    }
}

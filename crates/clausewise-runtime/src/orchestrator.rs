//! Review orchestration.
//!
//! The orchestrator runs one contract through the full pipeline:
//! - Translation pre-processing (Devanagari contracts, optional)
//! - Deterministic clause analysis from `clausewise-core`
//! - AI narrative with fallback
//! - Audit record
//!
//! Only the analysis is authoritative. Every other step degrades on failure,
//! so `review` has no error path.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use clausewise_core::{AnalysisResult, Analyzer, AuditRecord};

use crate::audit_log::AuditLog;
use crate::config::RuntimeConfig;
use crate::language::{detect_script, Script};
use crate::narrator::{NarrativeOutcome, NarrativeService};
use crate::providers::LlmProvider;
use crate::resilience::{LlmUsage, NarrativeFallback};

/// Everything produced for one contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractReview {
    pub file_name: String,

    /// The analyzed text: the English translation when one was made
    pub text: String,

    /// Script detected in the submitted text
    pub script: Script,

    pub translated: bool,

    pub analysis: AnalysisResult,

    pub narrative: NarrativeOutcome,

    /// Where the audit record was written, if it was
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_path: Option<PathBuf>,
}

/// Runs contract reviews.
///
/// # Architecture
/// - Core analysis: synchronous, deterministic, never fails
/// - Collaborators: narrative and translation through one [`NarrativeService`]
///   whose circuit, budget and cache span all reviews
/// - Batch: independent documents reviewed concurrently, order preserved
pub struct ReviewOrchestrator {
    analyzer: Analyzer,
    narrator: NarrativeService,
    audit_log: Option<AuditLog>,
    translate_non_english: bool,
}

impl ReviewOrchestrator {
    pub fn builder() -> ReviewOrchestratorBuilder {
        ReviewOrchestratorBuilder::new()
    }

    /// Review one contract.
    pub async fn review(&self, file_name: &str, text: &str) -> ContractReview {
        let script = detect_script(text);
        let (text, translated) = self.prepare_text(file_name, text, script).await;

        let analysis = self.analyzer.analyze(&text);
        let narrative = self
            .narrator
            .narrate(&text, &analysis.document_fingerprint)
            .await;
        let audit_path = self.write_audit(file_name, &analysis).await;

        tracing::info!(
            file_name,
            clauses = analysis.len(),
            highest_risk = ?analysis.highest_risk(),
            degraded = narrative.is_degraded(),
            "Review complete"
        );

        ContractReview {
            file_name: file_name.to_string(),
            text,
            script,
            translated,
            analysis,
            narrative,
            audit_path,
        }
    }

    /// Review several contracts concurrently. Results keep input order.
    pub async fn review_many<I, N, T>(&self, documents: I) -> Vec<ContractReview>
    where
        I: IntoIterator<Item = (N, T)>,
        N: AsRef<str>,
        T: AsRef<str>,
    {
        join_all(
            documents
                .into_iter()
                .map(|(name, text)| async move { self.review(name.as_ref(), text.as_ref()).await }),
        )
        .await
    }

    async fn prepare_text(&self, file_name: &str, text: &str, script: Script) -> (String, bool) {
        if !self.translate_non_english || !script.needs_translation() {
            return (text.to_string(), false);
        }
        if !self.narrator.has_provider() {
            tracing::debug!(file_name, ?script, "No provider, analyzing untranslated text");
            return (text.to_string(), false);
        }

        match self.narrator.translate(text).await {
            Ok(translated) => {
                tracing::info!(file_name, ?script, "Translated to English for analysis");
                (translated, true)
            }
            Err(reason) => {
                tracing::warn!(file_name, %reason, "Translation failed, using original text");
                (text.to_string(), false)
            }
        }
    }

    async fn write_audit(&self, file_name: &str, analysis: &AnalysisResult) -> Option<PathBuf> {
        let log = self.audit_log.as_ref()?;
        match log.write(&AuditRecord::new(file_name, analysis)).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(file_name, error = %e, "Audit record not written");
                None
            }
        }
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn narrator(&self) -> &NarrativeService {
        &self.narrator
    }

    /// Provider usage across all reviews so far.
    pub fn usage(&self) -> LlmUsage {
        self.narrator.usage()
    }
}

/// Builder for ReviewOrchestrator.
pub struct ReviewOrchestratorBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    config: RuntimeConfig,
    analyzer: Option<Analyzer>,
    fallback: Option<Arc<dyn NarrativeFallback>>,
    audit_log: Option<AuditLog>,
}

impl ReviewOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            config: RuntimeConfig::default(),
            analyzer: None,
            fallback: None,
            audit_log: None,
        }
    }

    /// Set the LLM provider. Without one every narrative is a fallback.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Use an analyzer built from a custom keyword policy.
    pub fn analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn fallback(mut self, fallback: Arc<dyn NarrativeFallback>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Use an already opened audit log instead of `config.audit_dir`.
    pub fn audit_log(mut self, audit_log: AuditLog) -> Self {
        self.audit_log = Some(audit_log);
        self
    }

    /// Build the orchestrator.
    ///
    /// An audit directory that cannot be created disables auditing with a
    /// warning.
    pub async fn build(self) -> ReviewOrchestrator {
        let audit_log = match (self.audit_log, &self.config.audit_dir) {
            (Some(log), _) => Some(log),
            (None, Some(dir)) => match AuditLog::new(dir.clone()).await {
                Ok(log) => Some(log),
                Err(e) => {
                    tracing::warn!(error = %e, "Audit log disabled");
                    None
                }
            },
            (None, None) => None,
        };

        let translate_non_english = self.config.translate_non_english;
        let mut narrator = NarrativeService::new(self.provider, self.config);
        if let Some(fallback) = self.fallback {
            narrator = narrator.with_fallback(fallback);
        }

        ReviewOrchestrator {
            analyzer: self.analyzer.unwrap_or_default(),
            narrator,
            audit_log,
            translate_non_english,
        }
    }
}

impl Default for ReviewOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

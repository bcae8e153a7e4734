//! Keyword policy parsing from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_policy_schema;
use crate::types::{Category, RiskLevel};

/// Built-in category triggers, in precedence order.
pub const DEFAULT_CATEGORY_TRIGGERS: &[(Category, &[&str])] = &[
    (Category::Termination, &["termination", "terminate", "notice period"]),
    (Category::Payment, &["shall pay", "payment", "invoice", "INR"]),
    (Category::Confidentiality, &["confidential", "non-disclosure", "nda"]),
    (Category::Penalty, &["penalty", "fine", "late fee"]),
];

/// Built-in risk triggers, in precedence order. `Low` has none.
pub const DEFAULT_RISK_TRIGGERS: &[(RiskLevel, &[&str])] = &[
    (
        RiskLevel::High,
        &[
            "unilateral termination",
            "indemnity unlimited",
            "penalty",
            "confidentiality breach",
        ],
    ),
    (RiskLevel::Medium, &["automatic renewal", "late payment fees"]),
    (RiskLevel::Low, &[]),
];

/// Errors that can occur when loading a policy.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Failed to read policy file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Policy does not match schema: {}", .0.join("; "))]
    SchemaViolation(Vec<String>),

    #[error("Policy validation failed: {0}")]
    ValidationError(String),
}

/// Trigger phrases for one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRule {
    pub category: Category,

    #[serde(default)]
    pub triggers: Vec<String>,
}

/// Trigger phrases for one risk tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskRule {
    pub level: RiskLevel,

    #[serde(default)]
    pub triggers: Vec<String>,
}

/// The keyword tables driving classification and risk scoring.
///
/// Rule order is precedence order: the first rule with any matching
/// trigger decides the label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Policy {
    /// Version of this policy (semver-ish)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_version: Option<String>,

    /// Human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Category rules in precedence order
    pub categories: Vec<CategoryRule>,

    /// Risk rules in precedence order
    pub risks: Vec<RiskRule>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            policy_version: Some("1.0".to_string()),
            name: Some("built-in".to_string()),
            categories: DEFAULT_CATEGORY_TRIGGERS
                .iter()
                .map(|(category, triggers)| CategoryRule {
                    category: *category,
                    triggers: triggers.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
            risks: DEFAULT_RISK_TRIGGERS
                .iter()
                .map(|(level, triggers)| RiskRule {
                    level: *level,
                    triggers: triggers.iter().map(|t| t.to_string()).collect(),
                })
                .collect(),
        }
    }
}

impl Policy {
    /// Parse a policy from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, PolicyError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a policy from JSON string.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a policy from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a policy from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Load a policy file, picking the format from its extension.
    ///
    /// `.json` is parsed as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_file(path),
            _ => Self::from_yaml_file(path),
        }
    }

    /// Serialize the policy as YAML.
    pub fn to_yaml(&self) -> Result<String, PolicyError> {
        Ok(serde_yaml::to_string(self)?)
    }

    fn from_value(value: serde_json::Value) -> Result<Self, PolicyError> {
        validate_policy_schema(&value).map_err(PolicyError::SchemaViolation)?;
        let policy: Policy = serde_json::from_value(value)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Check the semantic constraints the schema cannot express.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let mut seen = HashSet::new();
        for rule in &self.categories {
            if !seen.insert(rule.category) {
                return Err(PolicyError::ValidationError(format!(
                    "Duplicate category rule: {}",
                    rule.category
                )));
            }
            if rule.category.is_fallback() && !rule.triggers.is_empty() {
                return Err(PolicyError::ValidationError(format!(
                    "{} is the fallback category and cannot carry triggers",
                    rule.category
                )));
            }
            check_triggers(rule.category.as_str(), &rule.triggers)?;
        }

        let mut seen = HashSet::new();
        for rule in &self.risks {
            if !seen.insert(rule.level) {
                return Err(PolicyError::ValidationError(format!(
                    "Duplicate risk rule: {}",
                    rule.level
                )));
            }
            if rule.level.is_fallback() && !rule.triggers.is_empty() {
                return Err(PolicyError::ValidationError(format!(
                    "{} is the fallback risk level and cannot carry triggers",
                    rule.level
                )));
            }
            check_triggers(rule.level.as_str(), &rule.triggers)?;
        }

        Ok(())
    }

    /// Total number of trigger phrases across both tables.
    pub fn trigger_count(&self) -> usize {
        self.categories.iter().map(|r| r.triggers.len()).sum::<usize>()
            + self.risks.iter().map(|r| r.triggers.len()).sum::<usize>()
    }
}

fn check_triggers(label: &str, triggers: &[String]) -> Result<(), PolicyError> {
    if triggers.iter().any(|t| t.trim().is_empty()) {
        return Err(PolicyError::ValidationError(format!(
            "Blank trigger phrase in {} rule",
            label
        )));
    }
    Ok(())
}

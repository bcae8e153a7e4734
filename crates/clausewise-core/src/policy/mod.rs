//! Keyword policy tables.
//!
//! Classification and risk scoring are driven by ordered trigger-phrase
//! tables. The built-in tables are the default; custom tables can be loaded
//! from YAML or JSON and are validated against an embedded JSON Schema.

mod parser;
mod schema;

pub use parser::{
    CategoryRule, Policy, PolicyError, RiskRule, DEFAULT_CATEGORY_TRIGGERS, DEFAULT_RISK_TRIGGERS,
};
pub use schema::{validate_policy_schema, SchemaError};

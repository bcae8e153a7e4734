//! The AI narrative and its reply parser.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Prose accompanying a clause analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub summary: String,
    pub risks: String,
    pub suggestions: String,
}

/// Why a provider reply could not be read as a narrative.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NarrativeParseError {
    #[error("reply is not JSON: {0}")]
    NotJson(String),

    #[error("reply is not a JSON object")]
    NotAnObject,

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("field '{0}' must be a string or a list of strings")]
    InvalidField(&'static str),
}

/// Parse a provider reply into a narrative.
///
/// Accepts a bare JSON object or one wrapped in a Markdown code fence.
/// A field given as a list of strings is joined with newlines.
pub fn parse_narrative(reply: &str) -> Result<Narrative, NarrativeParseError> {
    let value: JsonValue = serde_json::from_str(strip_code_fence(reply))
        .map_err(|e| NarrativeParseError::NotJson(e.to_string()))?;

    let object = value.as_object().ok_or(NarrativeParseError::NotAnObject)?;
    let field = |name: &'static str| -> Result<String, NarrativeParseError> {
        match object.get(name) {
            None | Some(JsonValue::Null) => Err(NarrativeParseError::MissingField(name)),
            Some(JsonValue::String(s)) => Ok(s.clone()),
            Some(JsonValue::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or(NarrativeParseError::InvalidField(name))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|lines| lines.join("\n")),
            Some(_) => Err(NarrativeParseError::InvalidField(name)),
        }
    };

    Ok(Narrative {
        summary: field("summary")?,
        risks: field("risks")?,
        suggestions: field("suggestions")?,
    })
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

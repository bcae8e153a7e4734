//! Script detection for translation pre-processing.

use serde::{Deserialize, Serialize};

/// Dominant writing system of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Script {
    Latin,
    Devanagari,
    Other,
}

impl Script {
    /// Whether the text should be translated before analysis.
    pub fn needs_translation(&self) -> bool {
        matches!(self, Script::Devanagari)
    }
}

/// Classify the dominant script by counting alphabetic characters.
///
/// Ties and text without letters resolve to `Latin`, so empty or numeric
/// documents are never sent for translation.
pub fn detect_script(text: &str) -> Script {
    let (mut latin, mut devanagari, mut other) = (0usize, 0usize, 0usize);

    for ch in text.chars() {
        if ('\u{0900}'..='\u{097F}').contains(&ch) || ('\u{A8E0}'..='\u{A8FF}').contains(&ch) {
            devanagari += 1;
        } else if ch.is_ascii_alphabetic() || ('\u{00C0}'..='\u{024F}').contains(&ch) {
            latin += 1;
        } else if ch.is_alphabetic() {
            other += 1;
        }
    }

    if devanagari > latin && devanagari >= other {
        Script::Devanagari
    } else if other > latin && other > devanagari {
        Script::Other
    } else {
        Script::Latin
    }
}

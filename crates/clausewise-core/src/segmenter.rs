//! Clause segmentation.
//!
//! Splits contract text at numbered-list markers ("\n12. "). The split is
//! structural only: nothing here looks at what a clause says.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// A newline (or the start of the document) followed by digits, a period
    /// and one whitespace character.
    static ref CLAUSE_BOUNDARY: Regex = Regex::new(r"(?:\A\s*|\n)\d+\.\s").unwrap();
}

/// Segmented document text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segmentation {
    /// Text before the first boundary marker, if non-empty
    pub preamble: Option<String>,

    /// Clause bodies in document order, trimmed and non-empty
    pub clauses: Vec<String>,
}

/// Segment a document into its preamble and clauses.
///
/// With no boundary marker the whole text is a single clause (or none, if
/// it is blank) and there is no preamble. Fragments that are empty after
/// trimming are dropped, so consecutive markers produce no clause.
pub fn segment(text: &str) -> Segmentation {
    if !CLAUSE_BOUNDARY.is_match(text) {
        return Segmentation {
            preamble: None,
            clauses: trimmed(text).into_iter().collect(),
        };
    }

    let mut fragments = CLAUSE_BOUNDARY.split(text);
    let preamble = fragments.next().and_then(trimmed);
    let clauses = fragments.filter_map(trimmed).collect();

    Segmentation { preamble, clauses }
}

/// Split a document into clause strings, discarding any preamble.
pub fn split_clauses(text: &str) -> Vec<String> {
    segment(text).clauses
}

fn trimmed(fragment: &str) -> Option<String> {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        None
    } else {
        Some(fragment.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_clauses_with_preamble() {
        let seg = segment("Intro text\n1. First clause.\n2. Second clause.");
        assert_eq!(seg.clauses, vec!["First clause.", "Second clause."]);
        assert_eq!(seg.preamble.as_deref(), Some("Intro text"));
    }

    #[test]
    fn test_no_marker_is_single_clause() {
        let seg = segment("  The whole agreement in one paragraph.  ");
        assert_eq!(seg.clauses, vec!["The whole agreement in one paragraph."]);
        assert!(seg.preamble.is_none());
    }

    #[test]
    fn test_blank_input_yields_nothing() {
        assert!(split_clauses("").is_empty());
        assert!(split_clauses(" \n\t \n").is_empty());
    }

    #[test]
    fn test_document_starting_with_marker_keeps_first_clause() {
        let clauses = split_clauses("1. Scope of work.\n2. Fees.\n3. Term.");
        assert_eq!(clauses, vec!["Scope of work.", "Fees.", "Term."]);

        let clauses = split_clauses("\n\n  1. Scope of work.\n2. Fees.");
        assert_eq!(clauses, vec!["Scope of work.", "Fees."]);
    }

    #[test]
    fn test_consecutive_markers_produce_no_empty_clause() {
        let clauses = split_clauses("Header\n1. \n2. Payment terms.\n3.  \n4. Governing law.");
        assert_eq!(clauses, vec!["Payment terms.", "Governing law."]);
    }

    #[test]
    fn test_multi_digit_numbers_and_multiline_bodies() {
        let text = "Recitals\n9. Ninth clause\ncontinues here.\n10. Tenth clause.\n11. Eleventh.";
        let clauses = split_clauses(text);
        assert_eq!(
            clauses,
            vec!["Ninth clause\ncontinues here.", "Tenth clause.", "Eleventh."]
        );
    }

    #[test]
    fn test_inline_numbers_are_not_boundaries() {
        // "section 2. " is not preceded by a newline
        let clauses = split_clauses("Refer to section 2. for details.\nAmounts are 3.5 percent.");
        assert_eq!(clauses.len(), 1);
    }

    #[test]
    fn test_marker_requires_whitespace_after_period() {
        let clauses = split_clauses("Intro\n1.First without space");
        assert_eq!(clauses, vec!["Intro\n1.First without space"]);
    }
}

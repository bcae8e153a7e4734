//! Plain-text, JSON and PDF review reports.
//!
//! The text report is restricted to printable ASCII so it can be fed to
//! renderers with basic fonts, and word-wrapped to a fixed width. The PDF
//! report lays those same lines out in Courier, one review per page run.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use thiserror::Error;

use crate::narrator::NarrativeSource;
use crate::orchestrator::ContractReview;

const PREVIEW_CHARS: usize = 2000;
const CLAUSE_EXCERPT_CHARS: usize = 200;

// A4 in points, Courier 9pt: 90 columns fit inside the margins
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 9;
const LEADING: i64 = 11;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to encode PDF content: {0}")]
    Encode(#[from] lopdf::Error),

    #[error("Failed to write PDF: {0}")]
    Write(#[from] std::io::Error),
}

/// Renders a [`ContractReview`] as a report.
#[derive(Debug, Clone)]
pub struct ReportRenderer {
    width: usize,
}

impl ReportRenderer {
    pub const DEFAULT_WIDTH: usize = 90;

    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn render_text(&self, review: &ContractReview) -> String {
        let mut body = String::from("Contract Review Report\n\n");
        body.push_str(&format!("File: {}\n", review.file_name));
        if review.translated {
            body.push_str("Translated to English before analysis.\n");
        }

        body.push_str("\nContract Preview:\n");
        body.push_str(&truncate_chars(&review.text, PREVIEW_CHARS));
        body.push_str("...\n\nClauses Detected:\n");
        for clause in &review.analysis.clauses {
            body.push_str(&format!(
                "{}: [{}] {}... Risk: {}\n",
                clause.id,
                clause.category,
                truncate_chars(&clause.text, CLAUSE_EXCERPT_CHARS),
                clause.risk
            ));
        }

        let narrative = &review.narrative.narrative;
        body.push_str(&format!("\nAnalysis Summary:\n{}\n", narrative.summary));
        body.push_str(&format!("\nRisks:\n{}\n", narrative.risks));
        body.push_str(&format!("\nSuggestions:\n{}\n", narrative.suggestions));

        match &review.narrative.source {
            NarrativeSource::Provider => {}
            NarrativeSource::Cache { reason } => {
                body.push_str(&format!("\nNarrative served from cache: {}\n", reason));
            }
            NarrativeSource::Fallback { reason, .. } => {
                body.push_str(&format!("\nAI narrative unavailable: {}\n", reason));
            }
        }

        wrap(&sanitize(&body), self.width)
    }

    pub fn render_json(&self, review: &ContractReview) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(review)
    }

    /// Render reviews as one PDF. Each review starts on a new page.
    pub fn render_pdf(&self, reviews: &[ContractReview]) -> Result<Vec<u8>, ReportError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Courier".to_vec())),
        ]));
        let resources_id = doc.add_object(Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "F1",
                Object::Reference(font_id),
            )])),
        )]));

        let mut page_ids = Vec::new();
        for review in reviews {
            let text = self.render_text(review);
            let lines: Vec<&str> = text.lines().collect();
            for chunk in lines.chunks(LINES_PER_PAGE) {
                page_ids.push(add_page(&mut doc, pages_id, chunk)?);
            }
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(page_ids.len() as i64)),
            (
                "Kids",
                Object::Array(page_ids.into_iter().map(Object::Reference).collect()),
            ),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(PAGE_WIDTH),
                    Object::Integer(PAGE_HEIGHT),
                ]),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

fn add_page(doc: &mut Document, pages_id: ObjectId, lines: &[&str]) -> Result<ObjectId, ReportError> {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Object::Integer(FONT_SIZE)],
        ),
        Operation::new("TL", vec![Object::Integer(LEADING)]),
        Operation::new(
            "Td",
            vec![
                Object::Integer(MARGIN),
                Object::Integer(PAGE_HEIGHT - MARGIN - LEADING),
            ],
        ),
    ];
    for line in lines {
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(line.as_bytes().to_vec(), StringFormat::Literal)],
        ));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));
    Ok(doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        ("Contents", Object::Reference(content_id)),
    ])))
}

impl Default for ReportRenderer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WIDTH)
    }
}

/// Replace every character outside printable ASCII with a space.
/// Newlines are kept.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' | ' '..='~' => c,
            _ => ' ',
        })
        .collect()
}

/// Greedy word wrap. A word longer than `width` gets a line of its own.
pub fn wrap(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(text.len());

    for line in text.lines() {
        let mut current = String::new();
        for word in line.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
            } else if current.len() + 1 + word.len() > width {
                out.push_str(&current);
                out.push('\n');
                current = word.to_string();
            } else {
                current.push(' ');
                current.push_str(word);
            }
        }
        out.push_str(&current);
        out.push('\n');
    }

    out
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

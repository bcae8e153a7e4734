//! Text extraction from contract files.
//!
//! The extractor is chosen by extension: `.pdf` through `pdf-extract`,
//! `.docx` by reading the paragraphs of `word/document.xml`, anything else
//! as UTF-8 text with invalid sequences replaced. The result is trimmed, so
//! surrounding whitespace never changes a document's fingerprint.
//!
//! Extraction never aborts a batch. A file that cannot be read or parsed
//! yields an empty string and a warning.

use quick_xml::events::Event;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Failed to read file: {0}")]
    Read(#[from] std::io::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("Not a DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Malformed DOCX body: {0}")]
    Docx(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Text,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => DocumentKind::Pdf,
            Some("docx") => DocumentKind::Docx,
            _ => DocumentKind::Text,
        }
    }
}

/// Name recorded for a file in reports and audit records.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Extract a file's text. Failures yield an empty string.
pub async fn extract_text(path: &Path) -> String {
    let kind = DocumentKind::from_path(path);
    match try_extract(path, kind).await {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                tracing::warn!(path = %path.display(), ?kind, "No text found in file");
            }
            text.to_string()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), ?kind, error = %e, "Could not extract text, treating as empty");
            String::new()
        }
    }
}

async fn try_extract(path: &Path, kind: DocumentKind) -> Result<String, ExtractError> {
    let bytes = tokio::fs::read(path).await?;
    match kind {
        DocumentKind::Text => Ok(decode(&bytes)),
        // pdf-extract is CPU-bound and may panic on damaged files
        DocumentKind::Pdf => tokio::task::spawn_blocking(move || pdf_text(&bytes))
            .await
            .map_err(|e| ExtractError::Pdf(e.to_string()))?,
        DocumentKind::Docx => docx_text(&bytes),
    }
}

fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

fn pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Paragraph text of a Word document, one line per `w:p`.
fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name("word/document.xml")?.read_to_string(&mut xml)?;

    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ExtractError::Docx(e.to_string()))?;
        match event {
            Event::Start(tag) if tag.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(tag) => match tag.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Event::Empty(tag) => match tag.name().as_ref() {
                b"w:tab" => text.push('\t'),
                b"w:br" | b"w:cr" => text.push('\n'),
                _ => {}
            },
            Event::Text(run) if in_run_text => {
                let run = run.unescape().map_err(|e| ExtractError::Docx(e.to_string()))?;
                text.push_str(&run);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("clausewise-extract-{}-{}", std::process::id(), name));
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn docx(body: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        );
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("msa.pdf")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("MSA.PDF")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("nda.docx")), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_path(Path::new("lease.txt")), DocumentKind::Text);
        assert_eq!(DocumentKind::from_path(Path::new("CONTRACT")), DocumentKind::Text);
    }

    #[test]
    fn test_decode_lossy() {
        assert_eq!(decode(b"1. Pay \xFF now"), "1. Pay \u{FFFD} now");
        assert_eq!(decode(b"\xEF\xBB\xBF1. Pay"), "1. Pay");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/contracts/msa.txt")), "msa.txt");
    }

    #[test]
    fn test_docx_paragraphs() {
        let bytes = docx(
            r#"<w:p><w:r><w:t>Parties</w:t></w:r></w:p>
<w:p><w:r><w:t xml:space="preserve">1. Fees &amp; costs </w:t></w:r><w:r><w:t>are due.</w:t></w:r></w:p>
<w:p><w:r><w:t>2. A</w:t><w:tab/><w:t>penalty applies.</w:t></w:r></w:p>"#,
        );
        assert_eq!(
            docx_text(&bytes).unwrap(),
            "Parties\n1. Fees & costs are due.\n2. A\tpenalty applies.\n"
        );
    }

    #[test]
    fn test_docx_without_body_fails() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<w:styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(matches!(docx_text(&bytes), Err(ExtractError::Archive(_))));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let path = PathBuf::from("/nonexistent/clausewise/contract.txt");
        assert_eq!(extract_text(&path).await, "");
    }

    #[tokio::test]
    async fn test_text_is_trimmed() {
        let path = temp_file("trim.txt", b"\n  Intro\n1. A late fee applies.\n\n  ");
        assert_eq!(extract_text(&path).await, "Intro\n1. A late fee applies.");
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_trailing_whitespace_keeps_fingerprint() {
        let plain = temp_file("plain.txt", b"1. A penalty applies.");
        let padded = temp_file("padded.txt", b"1. A penalty applies.\n\n\n");
        assert_eq!(
            clausewise_core::fingerprint(&extract_text(&plain).await),
            clausewise_core::fingerprint(&extract_text(&padded).await)
        );
        std::fs::remove_file(&plain).unwrap();
        std::fs::remove_file(&padded).unwrap();
    }

    #[tokio::test]
    async fn test_docx_file_dispatch() {
        let path = temp_file("nda.docx", &docx("<w:p><w:r><w:t>1. A penalty applies.</w:t></w:r></w:p>"));
        assert_eq!(extract_text(&path).await, "1. A penalty applies.");
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_damaged_documents_are_empty() {
        // Readable as text, but not as the format the extension claims
        let pdf = temp_file("broken.pdf", b"1. A penalty applies.");
        let docx = temp_file("broken.docx", b"1. A penalty applies.");
        assert_eq!(extract_text(&pdf).await, "");
        assert_eq!(extract_text(&docx).await, "");
        std::fs::remove_file(&pdf).unwrap();
        std::fs::remove_file(&docx).unwrap();
    }

    #[tokio::test]
    async fn test_pdf_file_dispatch() {
        let orchestrator = clausewise_runtime::ReviewOrchestrator::builder().build().await;
        let review = orchestrator.review("msa.txt", "1. A penalty applies.").await;
        let pdf = clausewise_runtime::ReportRenderer::default()
            .render_pdf(&[review])
            .unwrap();

        let path = temp_file("report.pdf", &pdf);
        let text = extract_text(&path).await;
        assert!(text.contains("Penalty"), "extracted: {:?}", text);
        std::fs::remove_file(&path).unwrap();
    }
}

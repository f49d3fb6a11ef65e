//! Text extraction from uploaded résumé documents.
//!
//! Best-effort by contract: a document that cannot be read yields an empty
//! string, never an error. Only an unsupported *format* is a caller error,
//! and that is decided before any bytes are inspected.

use std::io::{Cursor, Read};
use std::panic;

use anyhow::{anyhow, Context, Result};
use quick_xml::{events::Event, Reader as XmlReader};
use tracing::{info, warn};
use zip::ZipArchive;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    /// Legacy Word binary. Only readable when it is actually OOXML under a `.doc` name.
    Doc,
    Docx,
}

impl DocumentFormat {
    /// Picks the format from the upload's file name.
    pub fn from_filename(filename: &str) -> Result<Self, AppError> {
        let extension = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "doc" => Ok(DocumentFormat::Doc),
            "docx" => Ok(DocumentFormat::Docx),
            _ => Err(AppError::UnsupportedFormat(if filename.is_empty() {
                "<unnamed upload>".to_string()
            } else {
                filename.to_string()
            })),
        }
    }
}

/// Extracts plain text from `bytes`. Returns an empty string on any failure.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> String {
    let result = match format {
        DocumentFormat::Pdf => extract_pdf_text(bytes),
        DocumentFormat::Doc | DocumentFormat::Docx => extract_docx_text(bytes),
    };

    match result {
        Ok(text) => {
            info!(?format, text_len = text.len(), "document text extracted");
            text
        }
        Err(e) => {
            warn!(?format, error = %e, "document text extraction failed");
            String::new()
        }
    }
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    // pdf-extract panics on some malformed documents instead of returning Err.
    panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| anyhow!("PDF parser panicked"))?
        .context("failed to extract PDF text")
}

fn extract_docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("failed to open DOCX archive")?;

    let mut document = archive
        .by_name("word/document.xml")
        .context("missing word/document.xml")?;

    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .context("failed to read DOCX XML")?;

    paragraphs_from_document_xml(&xml)
}

/// Collects `<w:t>` runs, one line per `<w:p>` paragraph.
fn paragraphs_from_document_xml(xml: &str) -> Result<String> {
    let mut reader = XmlReader::from_str(xml);
    let mut buf = Vec::new();
    let mut output = String::new();
    let mut in_text_node = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"w:t" => in_text_node = true,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"w:tab" => output.push('\t'),
                b"w:br" => output.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text_node {
                    let value = e.unescape().map_err(|err| anyhow!(err))?;
                    output.push_str(&value);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"w:t" => in_text_node = false,
                b"w:p" => output.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => return Err(anyhow!("failed to parse DOCX XML: {}", err)),
            _ => {}
        }
        buf.clear();
    }

    Ok(output.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Skills: </w:t></w:r><w:r><w:t>Go, Rust &amp; Python</w:t></w:r></w:p>
    <w:p><w:r><w:t>A</w:t><w:tab/><w:t>B</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    fn docx_bytes(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_format_from_filename() {
        assert_eq!(
            DocumentFormat::from_filename("cv.PDF").unwrap(),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_filename("my.resume.docx").unwrap(),
            DocumentFormat::Docx
        );
        assert_eq!(
            DocumentFormat::from_filename("old.doc").unwrap(),
            DocumentFormat::Doc
        );
    }

    #[test]
    fn test_unsupported_formats_are_rejected() {
        for name in ["resume.txt", "resume", "", "archive.docx.zip"] {
            assert!(
                matches!(
                    DocumentFormat::from_filename(name),
                    Err(AppError::UnsupportedFormat(_))
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_docx_paragraphs_become_lines() {
        let text = extract_text(&docx_bytes(DOCUMENT_XML), DocumentFormat::Docx);
        assert_eq!(text, "Jane Doe\nSkills: Go, Rust & Python\nA\tB");
    }

    #[test]
    fn test_doc_extension_with_ooxml_content_is_read() {
        let text = extract_text(&docx_bytes(DOCUMENT_XML), DocumentFormat::Doc);
        assert!(text.starts_with("Jane Doe"));
    }

    #[test]
    fn test_garbage_bytes_yield_empty_string() {
        let garbage = b"definitely not a document";
        assert_eq!(extract_text(garbage, DocumentFormat::Pdf), "");
        assert_eq!(extract_text(garbage, DocumentFormat::Docx), "");
        assert_eq!(extract_text(&[], DocumentFormat::Doc), "");
    }

    #[test]
    fn test_archive_without_document_xml_yields_empty_string() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("other.txt", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(b"hi").unwrap();
        let bytes = writer.finish().unwrap().into_inner();
        assert_eq!(extract_text(&bytes, DocumentFormat::Docx), "");
    }
}

//! PDF text extraction backed by `lopdf`.
//!
//! Pages are extracted in page order and joined with [`PAGE_BREAK`]. A page
//! whose content stream cannot be decoded contributes no text; a document
//! without any text layer yields an empty string rather than an error.

use std::path::Path;
use std::time::Instant;

use lopdf::Document;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, Result};

/// Separator placed between consecutive pages (form feed on its own line).
pub const PAGE_BREAK: &str = "\n\u{000C}\n";

/// Linear text of a document plus page statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
    /// Pages that produced at least one non-whitespace character.
    pub pages_with_text: usize,
}

impl ExtractedText {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Extract text from a PDF held in memory.
///
/// # Errors
///
/// Returns [`ExtractionError::InvalidPdf`] when the bytes are not a PDF,
/// [`ExtractionError::PasswordRequired`] for an encrypted document without a
/// password and [`ExtractionError::InvalidPassword`] when decryption fails.
pub fn extract_text(bytes: &[u8], password: Option<&str>) -> Result<ExtractedText> {
    let start = Instant::now();
    let mut document = Document::load_mem(bytes).map_err(|e| ExtractionError::InvalidPdf {
        message: e.to_string(),
    })?;

    if document.is_encrypted() {
        let Some(password) = password else {
            return Err(ExtractionError::PasswordRequired);
        };
        document
            .decrypt(password)
            .map_err(|e| ExtractionError::InvalidPassword {
                message: e.to_string(),
            })?;
        debug!("decrypted PDF with supplied password");
    }

    let pages = document.get_pages();
    let page_count = pages.len();
    let mut page_texts = Vec::with_capacity(page_count);
    for page_number in pages.keys().copied() {
        match document.extract_text(&[page_number]) {
            Ok(text) => page_texts.push(text.trim_end().to_string()),
            Err(error) => {
                warn!(page_number, %error, "page text could not be decoded");
                page_texts.push(String::new());
            }
        }
    }

    let pages_with_text = page_texts
        .iter()
        .filter(|text| !text.trim().is_empty())
        .count();
    let text = if pages_with_text == 0 {
        warn!(page_count, "document has no extractable text layer");
        String::new()
    } else {
        page_texts.join(PAGE_BREAK)
    };

    info!(
        page_count,
        pages_with_text,
        char_count = text.chars().count(),
        duration_ms = start.elapsed().as_millis(),
        "text extraction complete"
    );
    Ok(ExtractedText {
        text,
        page_count,
        pages_with_text,
    })
}

/// Extract text from a PDF on disk.
pub fn extract_text_from_path(path: &Path, password: Option<&str>) -> Result<ExtractedText> {
    let bytes = std::fs::read(path).map_err(|source| ExtractionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    extract_text(&bytes, password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_pdf_bytes() {
        let err = extract_text(b"This is not a PDF", None).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidPdf { .. }));
        assert!(err.suggestion().is_some());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = extract_text_from_path(Path::new("/nonexistent/protocol.pdf"), None).unwrap_err();
        assert!(matches!(err, ExtractionError::Io { .. }));
    }

    #[test]
    fn empty_extracted_text_reports_zero_chars() {
        let extracted = ExtractedText::default();
        assert!(extracted.is_empty());
        assert_eq!(extracted.char_count(), 0);
    }
}

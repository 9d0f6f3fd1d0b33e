//! Ingestion error types.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal text extraction failure. The pipeline stops before chunking.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractionError {
    /// The input could not be read.
    #[error("Failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input is not a parseable PDF.
    #[error("Not a valid PDF: {message}")]
    InvalidPdf { message: String },

    /// The PDF is encrypted and no password was supplied.
    #[error("PDF is encrypted and no password was supplied")]
    PasswordRequired,

    /// The supplied password did not decrypt the PDF.
    #[error("Could not decrypt PDF: {message}")]
    InvalidPassword { message: String },
}

impl ExtractionError {
    /// Get a user-friendly suggestion for fixing this error.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Io { .. } => Some("Check that the file exists and is readable."),
            Self::InvalidPdf { .. } => Some("Make sure the upload is a PDF document."),
            Self::PasswordRequired => Some("Supply the document password with --password."),
            Self::InvalidPassword { .. } => Some("Check the document password and try again."),
        }
    }
}

/// Invalid chunking parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    #[error("chunk size must be at least 1 character")]
    ZeroSize,

    #[error("chunk overlap ({overlap}) must be smaller than the chunk size ({max_chars})")]
    OverlapTooLarge { overlap: usize, max_chars: usize },
}

pub type Result<T> = std::result::Result<T, ExtractionError>;

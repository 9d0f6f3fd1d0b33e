//! Pipeline error types.
//!
//! [`PipelineError`] is the single error surfaced to callers. Only text
//! extraction, configuration and serialization failures reach it; per-chunk
//! inference problems are warnings on the extracted document instead.

use std::io;
use std::path::PathBuf;

use ctp_extract::InferenceFailure;
use ctp_ingest::{ChunkError, ExtractionError};
use ctp_output::SerializationError;
use thiserror::Error;

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid TOML or has wrong value types.
    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A value is out of range.
    #[error("invalid configuration: {message}")]
    Invalid { message: String },

    /// Chunk size and overlap do not fit together.
    #[error("invalid chunking configuration: {0}")]
    Chunk(#[from] ChunkError),

    /// The inference backend could not be set up.
    #[error("failed to initialize {backend} backend: {source}")]
    Backend {
        backend: &'static str,
        #[source]
        source: InferenceFailure,
    },
}

impl ConfigError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Read { .. } => Some("Check the --config path."),
            Self::Parse { .. } => {
                Some("The config file takes [chunking], [inference] and [llm] tables.")
            }
            Self::Invalid { .. } => Some("Check the values in the config file and flags."),
            Self::Chunk(_) => Some("Use a chunk size of at least 1 and an overlap below it."),
            Self::Backend { .. } => Some("Check the [llm] endpoint or use --backend rules."),
        }
    }
}

/// Error type for a pipeline run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    // =========================================================================
    // FATAL STAGE ERRORS
    // =========================================================================
    /// The document could not be read as a PDF. Nothing downstream ran.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// The record could not be rendered.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    // =========================================================================
    // SETUP ERRORS
    // =========================================================================
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A background worker ended without a result.
    #[error("pipeline worker failed: {message}")]
    Worker { message: String },
}

impl PipelineError {
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Extraction(error) => error.suggestion(),
            Self::Serialization(error) => error.suggestion(),
            Self::Config(error) => error.suggestion(),
            Self::Worker { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

//! Per-chunk inference failures.
//!
//! None of these abort an extraction: the failing chunk contributes no
//! fields and the failure is reported back as a [`ChunkWarning`].

use std::fmt;

use thiserror::Error;

/// Why one chunk produced no fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum InferenceFailure {
    /// The request never produced a response.
    #[error("inference request failed: {message}")]
    Transport { message: String },

    /// The backend answered with a non-success status.
    #[error("inference backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The backend answered, but not with a usable record.
    #[error("inference response was not a usable record: {message}")]
    MalformedResponse { message: String },

    /// The chunk exceeded its time budget.
    #[error("inference did not finish within {timeout_ms} ms")]
    TimedOut { timeout_ms: u64 },

    /// The inferer panicked.
    #[error("inference task panicked: {message}")]
    Panicked { message: String },

    /// The inference task was cancelled before it produced a result.
    #[error("inference task was cancelled: {message}")]
    Cancelled { message: String },

    /// Backend-specific failure.
    #[error("{message}")]
    Backend { message: String },
}

impl InferenceFailure {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl fmt::Display) -> Self {
        Self::MalformedResponse {
            message: message.to_string(),
        }
    }

    /// Short category for summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Status { .. } => "status",
            Self::MalformedResponse { .. } => "malformed",
            Self::TimedOut { .. } => "timeout",
            Self::Panicked { .. } => "panic",
            Self::Cancelled { .. } => "cancelled",
            Self::Backend { .. } => "backend",
        }
    }
}

/// A non-fatal problem with one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkWarning {
    pub chunk_index: usize,
    pub failure: InferenceFailure,
}

impl fmt::Display for ChunkWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk {}: {}", self.chunk_index, self.failure)
    }
}

use thiserror::Error;

/// Errors raised when a mapping does not fit the record shape.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RecordError {
    /// A key held a value of the wrong type (for example a number where text
    /// is required, or an unrecognized study type).
    #[error("record does not match the expected shape: {source}")]
    Shape {
        #[from]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, RecordError>;

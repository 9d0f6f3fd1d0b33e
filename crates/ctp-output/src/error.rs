//! Serialization errors.

use std::io;
use std::path::PathBuf;

use ctp_model::RecordError;
use thiserror::Error;

/// Failure to produce an XML document. Never partially recovered: no XML is
/// returned when any of these occur.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerializationError {
    #[error("mapping is not a valid record: {0}")]
    Record(#[from] RecordError),

    #[error("failed to write XML: {0}")]
    Io(#[from] io::Error),

    #[error("failed to write XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("serialized XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to write {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SerializationError {
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Record(_) => Some(
                "Check the record JSON against `ctp fields`. Lists must be arrays and study_type must be Interventional, Observational or empty.",
            ),
            Self::File { .. } => Some("Check that the output location is writable."),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SerializationError>;

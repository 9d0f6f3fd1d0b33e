//! Transient storage for uploaded PDFs.
//!
//! An [`UploadedPdf`] owns a named temporary file. The file is removed when
//! the value is dropped, whichever way processing ends.

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ExtractionError, Result};
use crate::pdf::{ExtractedText, extract_text_from_path};

/// An uploaded document spooled to a temporary `.pdf` file.
#[derive(Debug)]
pub struct UploadedPdf {
    file: NamedTempFile,
    len: u64,
}

impl UploadedPdf {
    /// Spool everything from `reader` into a fresh temporary file.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("ctp-upload-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|source| spool_error(std::env::temp_dir(), source))?;
        let copied = io::copy(&mut reader, &mut file);
        let len = match copied.and_then(|len| file.as_file_mut().flush().map(|()| len)) {
            Ok(len) => len,
            Err(source) => return Err(spool_error(file.path().to_path_buf(), source)),
        };
        debug!(path = %file.path().display(), len, "spooled upload");
        Ok(Self { file, len })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(bytes)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Size of the upload in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn extract_text(&self, password: Option<&str>) -> Result<ExtractedText> {
        extract_text_from_path(self.path(), password)
    }
}

fn spool_error(path: PathBuf, source: io::Error) -> ExtractionError {
    ExtractionError::Io { path, source }
}

use std::path::PathBuf;

use ctp_core::ExtractedDocument;

/// Everything `extract` produced, for the summary.
#[derive(Debug)]
pub struct ExtractResult {
    pub source: String,
    pub backend: &'static str,
    pub xml_path: PathBuf,
    pub record_path: Option<PathBuf>,
    pub document: ExtractedDocument,
}

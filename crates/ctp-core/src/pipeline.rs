//! End-to-end document pipeline.
//!
//! PDF bytes → text → chunks → per-chunk inference → merged record. Text
//! extraction failures abort the run; everything after it degrades to
//! defaults and reports warnings.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use ctp_extract::{
    ChunkInferer, ChunkWarning, ExtractionOutcome, FieldExtractor, LlmInferer, RuleInferer,
};
use ctp_ingest::{ChunkConfig, ExtractedText, chunk_text, extract_text, extract_text_from_path};
use ctp_model::ClinicalTrialRecord;
use ctp_output::SerializationError;
use tracing::{Instrument, info, info_span, warn};

use crate::config::{Backend, PipelineConfig};
use crate::error::{ConfigError, PipelineError, Result};

/// Counters describing one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub page_count: usize,
    pub pages_with_text: usize,
    pub char_count: usize,
    pub chunk_count: usize,
    pub failed_chunks: usize,
    pub duration_ms: u128,
}

/// The merged record of one document plus what went wrong along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub record: ClinicalTrialRecord,
    pub warnings: Vec<ChunkWarning>,
    pub stats: DocumentStats,
}

impl ExtractedDocument {
    pub fn to_xml(&self) -> std::result::Result<String, SerializationError> {
        ctp_output::to_xml(&self.record)
    }
}

/// Build the inferer selected by the configuration.
///
/// The LLM backend owns a blocking HTTP client, so call this outside of an
/// async context.
pub fn build_inferer(
    config: &PipelineConfig,
) -> std::result::Result<Arc<dyn ChunkInferer>, ConfigError> {
    match config.inference.backend {
        Backend::Rules => Ok(Arc::new(RuleInferer::new())),
        Backend::Llm => {
            let inferer =
                LlmInferer::new(config.llm_config()).map_err(|source| ConfigError::Backend {
                    backend: Backend::Llm.label(),
                    source,
                })?;
            Ok(Arc::new(inferer))
        }
    }
}

/// Configured pipeline. Reusable across documents; holds no per-document state.
#[derive(Debug, Clone)]
pub struct Pipeline {
    chunking: ChunkConfig,
    extractor: FieldExtractor,
}

impl Pipeline {
    /// Validate `config` and set up its inference backend.
    pub fn new(config: &PipelineConfig) -> std::result::Result<Self, ConfigError> {
        let inferer = build_inferer(config)?;
        Self::with_inferer(config, inferer)
    }

    /// Use a caller-supplied inferer instead of the configured backend.
    pub fn with_inferer(
        config: &PipelineConfig,
        inferer: Arc<dyn ChunkInferer>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            chunking: config.chunk_config()?,
            extractor: FieldExtractor::new(inferer, config.extractor_config()),
        })
    }

    pub fn backend(&self) -> &'static str {
        self.extractor.backend()
    }

    /// Run the pipeline over PDF bytes held in memory.
    pub async fn process_bytes(
        &self,
        bytes: Vec<u8>,
        password: Option<String>,
    ) -> Result<ExtractedDocument> {
        let span = info_span!("document", source = "memory", bytes = bytes.len());
        async move {
            let start = Instant::now();
            let text = run_blocking(move || extract_text(&bytes, password.as_deref())).await??;
            Ok::<_, PipelineError>(self.process_extracted(text, start).await)
        }
        .instrument(span)
        .await
    }

    /// Run the pipeline over a PDF on disk.
    pub async fn process_path(
        &self,
        path: &Path,
        password: Option<String>,
    ) -> Result<ExtractedDocument> {
        let span = info_span!("document", path = %path.display());
        let path: PathBuf = path.to_path_buf();
        async move {
            let start = Instant::now();
            let text =
                run_blocking(move || extract_text_from_path(&path, password.as_deref())).await??;
            Ok::<_, PipelineError>(self.process_extracted(text, start).await)
        }
        .instrument(span)
        .await
    }

    /// Run chunking and inference over already extracted text.
    pub async fn process_text(&self, text: &str) -> ExtractedDocument {
        let extracted = ExtractedText {
            text: text.to_string(),
            page_count: 0,
            pages_with_text: 0,
        };
        self.process_extracted(extracted, Instant::now()).await
    }

    async fn process_extracted(
        &self,
        extracted: ExtractedText,
        start: Instant,
    ) -> ExtractedDocument {
        if extracted.is_empty() {
            warn!("no text to extract fields from, producing a default record");
        }
        let chunks = chunk_text(&extracted.text, self.chunking);
        let ExtractionOutcome {
            record,
            warnings,
            chunk_count,
        } = self.extractor.extract(chunks).await;

        let stats = DocumentStats {
            page_count: extracted.page_count,
            pages_with_text: extracted.pages_with_text,
            char_count: extracted.char_count(),
            chunk_count,
            failed_chunks: warnings.len(),
            duration_ms: start.elapsed().as_millis(),
        };
        info!(
            chunk_count,
            failed_chunks = stats.failed_chunks,
            duration_ms = stats.duration_ms,
            "document processed"
        );
        ExtractedDocument {
            record,
            warnings,
            stats,
        }
    }
}

async fn run_blocking<T, F>(job: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| PipelineError::Worker {
            message: e.to_string(),
        })
}

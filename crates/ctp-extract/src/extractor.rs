//! Concurrent per-chunk inference with a deterministic merge.
//!
//! Each chunk is inferred on a blocking worker thread. A semaphore bounds how
//! many chunks are awaited at once, and every chunk gets its own time budget.
//! A chunk that overruns it is abandoned and gives its slot to the next one.
//! Completion order never matters: results are merged by chunk index.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use ctp_ingest::Chunk;
use ctp_model::ClinicalTrialRecord;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::error::{ChunkWarning, InferenceFailure};
use crate::inferer::ChunkInferer;
use crate::merge::RecordMerger;

/// Default per-chunk time budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of chunks inferred at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Time budget for one chunk, measured from when it starts running.
    pub timeout: Duration,
    /// Maximum number of in-flight inferences (at least 1).
    pub concurrency: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Result of extracting fields from every chunk of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionOutcome {
    pub record: ClinicalTrialRecord,
    /// One entry per failed chunk, in chunk order.
    pub warnings: Vec<ChunkWarning>,
    pub chunk_count: usize,
}

impl ExtractionOutcome {
    pub fn succeeded_chunks(&self) -> usize {
        self.chunk_count - self.warnings.len()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Runs a [`ChunkInferer`] over all chunks and merges the partial records.
#[derive(Clone)]
pub struct FieldExtractor {
    inferer: Arc<dyn ChunkInferer>,
    config: ExtractorConfig,
}

impl std::fmt::Debug for FieldExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldExtractor")
            .field("inferer", &self.inferer.name())
            .field("config", &self.config)
            .finish()
    }
}

impl FieldExtractor {
    pub fn new(inferer: Arc<dyn ChunkInferer>, config: ExtractorConfig) -> Self {
        Self { inferer, config }
    }

    pub fn config(&self) -> ExtractorConfig {
        self.config
    }

    pub fn backend(&self) -> &'static str {
        self.inferer.name()
    }

    /// Infer every chunk and merge the results.
    ///
    /// Never fails as a whole: a chunk that errors, panics or times out is
    /// reported in [`ExtractionOutcome::warnings`] and contributes nothing.
    /// Must be called from within a Tokio runtime.
    pub async fn extract(&self, chunks: Vec<Chunk>) -> ExtractionOutcome {
        let span = info_span!(
            "field_extraction",
            backend = self.inferer.name(),
            chunk_count = chunks.len()
        );
        self.extract_inner(chunks).instrument(span).await
    }

    async fn extract_inner(&self, chunks: Vec<Chunk>) -> ExtractionOutcome {
        let start = Instant::now();
        let chunk_count = chunks.len();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        let handles: Vec<(usize, JoinHandle<Result<ClinicalTrialRecord, InferenceFailure>>)> =
            chunks
                .into_iter()
                .map(|chunk| {
                    let index = chunk.index;
                    let handle = tokio::spawn(infer_one(
                        Arc::clone(&self.inferer),
                        Arc::clone(&semaphore),
                        chunk,
                        self.config.timeout,
                    ));
                    (index, handle)
                })
                .collect();

        let mut merger = RecordMerger::default();
        let mut warnings = Vec::new();
        for (chunk_index, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(error) => Err(join_failure(error)),
            };
            match result {
                Ok(partial) => merger.absorb(partial),
                Err(failure) => {
                    warn!(chunk_index, kind = failure.kind(), %failure, "chunk inference failed");
                    warnings.push(ChunkWarning {
                        chunk_index,
                        failure,
                    });
                }
            }
        }

        info!(
            chunk_count,
            failed_chunks = warnings.len(),
            duration_ms = start.elapsed().as_millis(),
            "field extraction complete"
        );
        ExtractionOutcome {
            record: merger.finish(),
            warnings,
            chunk_count,
        }
    }
}

async fn infer_one(
    inferer: Arc<dyn ChunkInferer>,
    semaphore: Arc<Semaphore>,
    chunk: Chunk,
    timeout: Duration,
) -> Result<ClinicalTrialRecord, InferenceFailure> {
    let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| InferenceFailure::backend(e.to_string()))?;
    let chunk_index = chunk.index;
    debug!(chunk_index, chars = chunk.char_len(), "chunk inference started");

    // The permit stays with this task, so a timed-out chunk frees its slot
    // even while the abandoned blocking job keeps running.
    let job = tokio::task::spawn_blocking(move || inferer.infer(&chunk));

    match tokio::time::timeout(timeout, job).await {
        Ok(Ok(result)) => result,
        Ok(Err(error)) => Err(join_failure(error)),
        Err(_) => Err(InferenceFailure::TimedOut {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

fn join_failure(error: JoinError) -> InferenceFailure {
    if error.is_panic() {
        InferenceFailure::Panicked {
            message: panic_message(&*error.into_panic()),
        }
    } else {
        InferenceFailure::Cancelled {
            message: error.to_string(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

//! The per-chunk inference capability.

use std::sync::Arc;

use ctp_ingest::Chunk;
use ctp_model::ClinicalTrialRecord;

use crate::error::InferenceFailure;

/// Infers whatever fields one chunk supports.
///
/// The returned record is partial: anything the chunk says nothing about
/// stays at its default. Implementations run on blocking worker threads and
/// may perform network I/O.
pub trait ChunkInferer: Send + Sync {
    /// Backend name used in logs and summaries.
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// Any failure is confined to this chunk.
    fn infer(&self, chunk: &Chunk) -> Result<ClinicalTrialRecord, InferenceFailure>;
}

impl<T: ChunkInferer + ?Sized> ChunkInferer for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn infer(&self, chunk: &Chunk) -> Result<ClinicalTrialRecord, InferenceFailure> {
        (**self).infer(chunk)
    }
}

impl<T: ChunkInferer + ?Sized> ChunkInferer for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn infer(&self, chunk: &Chunk) -> Result<ClinicalTrialRecord, InferenceFailure> {
        (**self).infer(chunk)
    }
}

//! Field extraction: per-chunk inference and deterministic merging.
//!
//! A [`ChunkInferer`] turns one chunk into a partial
//! [`ClinicalTrialRecord`](ctp_model::ClinicalTrialRecord). The
//! [`FieldExtractor`] fans chunks out over a bounded pool of blocking workers
//! and folds the partials back together in chunk order with
//! [`merge_records`], so the merged record never depends on which inference
//! finished first.
//!
//! Two backends are provided:
//!
//! - [`RuleInferer`]: offline, label-driven parsing
//! - [`LlmInferer`]: an OpenAI-compatible chat completions endpoint

pub mod error;
pub mod extractor;
pub mod inferer;
pub mod llm;
pub mod merge;
pub mod rules;

pub use error::{ChunkWarning, InferenceFailure};
pub use extractor::{
    DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT, ExtractionOutcome, ExtractorConfig, FieldExtractor,
};
pub use inferer::ChunkInferer;
pub use llm::{DEFAULT_ENDPOINT, DEFAULT_MODEL, LlmConfig, LlmInferer, parse_record_reply};
pub use merge::{RecordMerger, merge_records};
pub use rules::RuleInferer;

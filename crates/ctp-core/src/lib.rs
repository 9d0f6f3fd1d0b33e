//! Protocol extraction pipeline.
//!
//! Ties the stages together behind one call:
//!
//! 1. text extraction (`ctp-ingest`), fatal on failure
//! 2. chunking (`ctp-ingest`)
//! 3. bounded concurrent field inference and merge (`ctp-extract`)
//! 4. XML rendering (`ctp-output`), on demand
//!
//! ```no_run
//! # async fn run() -> Result<(), ctp_core::PipelineError> {
//! use ctp_core::{Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(&PipelineConfig::default())?;
//! let bytes = std::fs::read("protocol.pdf").unwrap_or_default();
//! let document = pipeline.process_bytes(bytes, None).await?;
//! println!("{}", document.to_xml()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{
    Backend, ChunkingSettings, DEFAULT_API_KEY_ENV, InferenceSettings, LlmSettings, PipelineConfig,
};
pub use error::{ConfigError, PipelineError, Result};
pub use pipeline::{DocumentStats, ExtractedDocument, Pipeline, build_inferer};

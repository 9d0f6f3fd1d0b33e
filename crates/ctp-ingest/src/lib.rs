//! Document ingestion: PDF text extraction and chunking.
//!
//! - **PDF** (`pdf`): linear text of a PDF with page breaks
//! - **Chunking** (`chunk`): overlapping char-bounded segments
//! - **Upload** (`upload`): scoped temporary files for uploaded bytes

pub mod chunk;
pub mod error;
pub mod pdf;
pub mod upload;

pub use chunk::{Chunk, ChunkConfig, Chunks, DEFAULT_MAX_CHARS, DEFAULT_OVERLAP, chunk_text};
pub use error::{ChunkError, ExtractionError, Result};
pub use pdf::{ExtractedText, PAGE_BREAK, extract_text, extract_text_from_path};
pub use upload::UploadedPdf;

//! Splitting document text into overlapping, bounded chunks.
//!
//! Sizes and offsets are counted in chars, never bytes, so a chunk boundary
//! can't fall inside a UTF-8 sequence. Chunk `i + 1` starts exactly
//! `overlap` chars before chunk `i` ends, which means dropping the first
//! `overlap` chars of every chunk after the first reconstructs the input.

use crate::error::ChunkError;

/// Default chunk size in chars.
pub const DEFAULT_MAX_CHARS: usize = 6000;

/// Default overlap between consecutive chunks in chars.
pub const DEFAULT_OVERLAP: usize = 400;

/// Chunking parameters. Construct through [`ChunkConfig::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    max_chars: usize,
    overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkConfig {
    /// # Errors
    ///
    /// Fails when `max_chars` is zero or `overlap >= max_chars`.
    pub fn new(max_chars: usize, overlap: usize) -> Result<Self, ChunkError> {
        if max_chars == 0 {
            return Err(ChunkError::ZeroSize);
        }
        if overlap >= max_chars {
            return Err(ChunkError::OverlapTooLarge { overlap, max_chars });
        }
        Ok(Self { max_chars, overlap })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }
}

/// A contiguous slice of the document text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the chunk sequence.
    pub index: usize,
    /// Char offset of the first char in the full text.
    pub start: usize,
    pub text: String,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Char offset one past the last char.
    pub fn end(&self) -> usize {
        self.start + self.char_len()
    }
}

/// Iterator over the chunks of a text. Clone it to restart.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    /// Byte offset of every char, followed by `text.len()`.
    offsets: Vec<usize>,
    config: ChunkConfig,
    next_start: Option<usize>,
    index: usize,
}

impl<'a> Chunks<'a> {
    pub fn new(text: &'a str, config: ChunkConfig) -> Self {
        let mut offsets: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
        offsets.push(text.len());
        let next_start = if text.is_empty() { None } else { Some(0) };
        Self {
            text,
            offsets,
            config,
            next_start,
            index: 0,
        }
    }

    fn char_count(&self) -> usize {
        self.offsets.len() - 1
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[self.offsets[start]..self.offsets[end]]
    }

    /// Pull the end back to just after the last whitespace in the second half
    /// of the window, as long as the chunk stays longer than the overlap.
    fn soft_end(&self, start: usize, window_end: usize) -> usize {
        let min_end = start + (self.config.max_chars / 2).max(self.config.overlap + 1);
        if min_end > window_end {
            return window_end;
        }
        (min_end..=window_end)
            .rev()
            .find(|&end| {
                self.slice(end - 1, end)
                    .chars()
                    .next()
                    .is_some_and(char::is_whitespace)
            })
            .unwrap_or(window_end)
    }
}

impl Iterator for Chunks<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let start = self.next_start?;
        let len = self.char_count();
        let window_end = (start + self.config.max_chars).min(len);
        let end = if window_end < len {
            self.soft_end(start, window_end)
        } else {
            window_end
        };

        self.next_start = if end >= len {
            None
        } else {
            Some(end - self.config.overlap)
        };

        let chunk = Chunk {
            index: self.index,
            start,
            text: self.slice(start, end).to_string(),
        };
        self.index += 1;
        Some(chunk)
    }
}

/// Split `text` into chunks. Empty text yields no chunks; any other text
/// yields at least one.
pub fn chunk_text(text: &str, config: ChunkConfig) -> Vec<Chunk> {
    Chunks::new(text, config).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_chars: usize, overlap: usize) -> ChunkConfig {
        ChunkConfig::new(max_chars, overlap).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        assert_eq!(ChunkConfig::new(0, 0), Err(ChunkError::ZeroSize));
        assert_eq!(
            ChunkConfig::new(10, 10),
            Err(ChunkError::OverlapTooLarge {
                overlap: 10,
                max_chars: 10
            })
        );
        assert!(ChunkConfig::new(1, 0).is_ok());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk_text("Brief Title: Trial A", config(100, 10));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Brief Title: Trial A");
        assert_eq!(chunks[0].start, 0);
    }

    #[test]
    fn text_exactly_chunk_size_is_a_single_chunk() {
        let chunks = chunk_text("abcdefghij", config(10, 3));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "abcdefghij");
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", ChunkConfig::default()).is_empty());
    }

    #[test]
    fn consecutive_chunks_overlap_exactly() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunk_text(text, config(10, 3));
        assert_eq!(chunks[0].text, "abcdefghij");
        assert_eq!(chunks[1].start, 7);
        assert_eq!(chunks[1].text, "hijklmnopq");
        assert_eq!(chunks.last().unwrap().end(), 26);
        for pair in chunks.windows(2) {
            assert_eq!(pair[1].start, pair[0].end() - 3);
        }
    }

    #[test]
    fn prefers_whitespace_boundaries() {
        let text = "alpha beta gamma delta epsilon";
        let chunks = chunk_text(text, config(12, 2));
        assert_eq!(chunks[0].text, "alpha beta ");
        assert!(chunks.iter().all(|c| c.char_len() <= 12));
    }

    #[test]
    fn counts_chars_not_bytes() {
        let text = "éééééééééé";
        let chunks = chunk_text(text, config(4, 1));
        assert!(chunks.iter().all(|c| c.char_len() <= 4));
        assert_eq!(chunks[0].text, "éééé");
    }

    #[test]
    fn iterator_restarts_when_cloned() {
        let iter = Chunks::new("one two three four five six", config(8, 2));
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert!(first.iter().enumerate().all(|(i, c)| c.index == i));
    }
}

//! Property tests for chunk coverage.

use ctp_ingest::{ChunkConfig, chunk_text};
use proptest::prelude::*;

fn reassemble(chunks: &[ctp_ingest::Chunk], overlap: usize) -> String {
    let mut rebuilt = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i == 0 {
            rebuilt.push_str(&chunk.text);
        } else {
            rebuilt.extend(chunk.text.chars().skip(overlap));
        }
    }
    rebuilt
}

proptest! {
    #[test]
    fn chunks_minus_overlap_reassemble_input(
        text in "\\PC{1,400}",
        max_chars in 1usize..64,
        overlap_seed in 0usize..64,
    ) {
        let overlap = overlap_seed % max_chars;
        let config = ChunkConfig::new(max_chars, overlap).unwrap();
        let chunks = chunk_text(&text, config);
        prop_assert!(!chunks.is_empty());
        prop_assert_eq!(reassemble(&chunks, overlap), text);
    }

    #[test]
    fn worded_text_reassembles_with_soft_boundaries(
        text in "[a-zé ,.\n]{1,600}",
        max_chars in 2usize..80,
        overlap_seed in 0usize..80,
    ) {
        let overlap = overlap_seed % max_chars;
        let config = ChunkConfig::new(max_chars, overlap).unwrap();
        let chunks = chunk_text(&text, config);
        prop_assert!(chunks.iter().all(|c| c.char_len() <= max_chars));
        for pair in chunks.windows(2) {
            prop_assert_eq!(pair[1].start + overlap, pair[0].end());
        }
        prop_assert_eq!(chunks.last().unwrap().end(), text.chars().count());
        prop_assert_eq!(reassemble(&chunks, overlap), text);
    }

    #[test]
    fn short_input_is_one_chunk(text in "\\PC{1,50}", extra in 0usize..20) {
        let len = text.chars().count();
        let config = ChunkConfig::new(len + extra, 0).unwrap();
        let chunks = chunk_text(&text, config);
        prop_assert_eq!(chunks.len(), 1);
        prop_assert_eq!(&chunks[0].text, &text);
    }
}

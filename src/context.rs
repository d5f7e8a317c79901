//! Turning ranked chunks into the context string handed to the chat layer.
//!
//! Each chunk becomes a block `[<document> - Page <n>]\n<text>`, blocks
//! are separated by a blank line, and the whole string (headers and
//! separators included) is kept within `max_chars` characters. The block
//! that would cross the budget has its text cut to fit and
//! [`TRUNCATION_MARKER`] appended; everything ranked after it is dropped.

use crate::search::ScoredChunk;

/// Appended to a block whose text was cut to fit the budget.
pub const TRUNCATION_MARKER: &str = "...";

/// Placed between consecutive blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Header line for a block, without the trailing newline.
pub fn block_header(document_name: &str, page_label: &str) -> String {
    format!("[{document_name} - Page {page_label}]")
}

/// Concatenate ranked chunks under a character budget.
///
/// Returns an empty string when there are no chunks, or when not even the
/// first block's header and one character of text fit.
///
/// # Examples
///
/// ```
/// use aaoifi_kb::chunking::{ChunkingConfig, chunk_text};
/// use aaoifi_kb::context::assemble;
/// use aaoifi_kb::search::search;
///
/// let chunks = chunk_text("--- Page 2 ---\nriba", ChunkingConfig::default());
/// let ranked = search(&chunks, "riba", 5);
/// assert_eq!(
///     assemble(&ranked, "AAOIFI Standards", 2000),
///     "[AAOIFI Standards - Page 2]\n--- Page 2 ---\nriba"
/// );
/// ```
pub fn assemble(
    ranked: &[ScoredChunk<'_>],
    document_name: &str,
    max_chars: usize,
) -> String {
    let mut out = String::new();
    let mut used = 0;

    for result in ranked {
        let separator = if out.is_empty() { "" } else { BLOCK_SEPARATOR };
        let lead = format!(
            "{separator}{}\n",
            block_header(document_name, &result.page_label())
        );
        let lead_len = lead.chars().count();
        let text_len = result.chunk.char_len();

        if used + lead_len + text_len <= max_chars {
            out.push_str(&lead);
            out.push_str(&result.chunk.text);
            used += lead_len + text_len;
            continue;
        }

        let remaining = max_chars.saturating_sub(used + lead_len);
        if remaining > 0 {
            out.push_str(&lead);
            out.extend(result.chunk.text.chars().take(remaining));
            out.push_str(TRUNCATION_MARKER);
        }
        break;
    }

    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::chunking::Chunk;

    fn chunk(index: usize, text: &str, page: Option<u32>) -> Chunk {
        Chunk {
            text: text.to_string(),
            index,
            start_offset: 0,
            page,
        }
    }

    fn ranked(chunks: &[Chunk]) -> Vec<ScoredChunk<'_>> {
        chunks
            .iter()
            .map(|chunk| ScoredChunk { chunk, score: 1 })
            .collect()
    }

    #[test]
    fn empty_input_gives_empty_string() {
        assert_eq!(assemble(&[], "AAOIFI Standards", 2000), "");
    }

    #[test]
    fn blocks_are_labelled_and_separated() {
        let chunks = vec![
            chunk(0, "Riba is prohibited.", Some(3)),
            chunk(1, "Gharar must be avoided.", None),
        ];
        let out = assemble(&ranked(&chunks), "AAOIFI Standards", 2000);

        assert_eq!(
            out,
            "[AAOIFI Standards - Page 3]\nRiba is prohibited.\n\n\
             [AAOIFI Standards - Page Unknown]\nGharar must be avoided."
        );
    }

    #[test]
    fn crossing_block_is_truncated_and_later_ones_dropped() {
        let chunks = vec![
            chunk(0, "aaaaaaaaaa", Some(1)),
            chunk(1, "bbbbbbbbbb", Some(2)),
            chunk(2, "cccccccccc", Some(3)),
        ];
        // "[D - Page 1]\n" is 13 chars, so the first block takes 23.
        // The second lead "\n\n[D - Page 2]\n" is 15 chars: 23 + 15 + 4 = 42.
        let out = assemble(&ranked(&chunks), "D", 42);

        assert_eq!(
            out,
            "[D - Page 1]\naaaaaaaaaa\n\n[D - Page 2]\nbbbb..."
        );
        assert!(!out.contains('c'));
        assert_eq!(out.chars().count(), 42 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn exact_fit_has_no_marker() {
        let chunks = vec![chunk(0, "aaaaaaaaaa", Some(1)), chunk(1, "b", None)];
        let out = assemble(&ranked(&chunks), "D", 23);
        assert_eq!(out, "[D - Page 1]\naaaaaaaaaa");
    }

    #[test]
    fn budget_smaller_than_header_gives_empty_string() {
        let chunks = vec![chunk(0, "aaaaaaaaaa", Some(1))];
        assert_eq!(assemble(&ranked(&chunks), "D", 13), "");
        assert_eq!(assemble(&ranked(&chunks), "D", 0), "");
    }

    #[test]
    fn truncation_respects_multibyte_characters() {
        let chunks = vec![chunk(0, "صكوك الإجارة", Some(9))];
        let out = assemble(&ranked(&chunks), "D", 17);
        assert_eq!(out, "[D - Page 9]\nصكوك...");
    }

    proptest! {
        #[test]
        fn never_exceeds_budget_plus_marker(
            texts in proptest::collection::vec("\\PC{0,80}", 0..8),
            max_chars in 0usize..400,
        ) {
            let chunks: Vec<_> = texts
                .iter()
                .enumerate()
                .map(|(i, t)| chunk(i, t, Some(i as u32 + 1)))
                .collect();
            let out = assemble(&ranked(&chunks), "AAOIFI Standards", max_chars);
            prop_assert!(
                out.chars().count() <= max_chars + TRUNCATION_MARKER.len()
            );
        }
    }
}

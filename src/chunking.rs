//! Splitting the corpus into fixed-size, overlapping character windows.
//!
//! Windows start at `0, step, 2 * step, ...` where `step = size - overlap`,
//! so consecutive chunks share exactly `overlap` characters and the union
//! of all chunks covers the corpus with no gaps. Sizes are counted in
//! Unicode scalar values, never bytes, so multi-byte text is never split
//! inside a character.

use crate::{
    error::{Error, Result},
    loader::page_marker,
};

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between adjacent chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Validated chunking parameters.
///
/// The constructor rejects `overlap >= chunk_size`, so a bad setting is
/// reported when configuration is built rather than when a query runs.
///
/// # Examples
///
/// ```
/// use aaoifi_kb::chunking::ChunkingConfig;
///
/// assert!(ChunkingConfig::new(40, 10).is_ok());
/// assert!(ChunkingConfig::new(40, 40).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk size must be positive".into()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({overlap}) must be smaller than chunk size \
                 ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// A window of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk text content.
    pub text: String,
    /// Zero-based position of this chunk in the corpus order.
    pub index: usize,
    /// Character offset where this chunk starts in the corpus.
    pub start_offset: usize,
    /// Page number taken from the first page marker inside the chunk.
    pub page: Option<u32>,
}

impl Chunk {
    /// Number of characters in the chunk.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Page label for display: the page number, or `Unknown`.
    pub fn page_label(&self) -> String {
        self.page
            .map_or_else(|| "Unknown".to_string(), |page| page.to_string())
    }
}

/// Split text into overlapping windows.
///
/// The final chunk may be shorter than the configured size. Empty text
/// yields no chunks.
///
/// # Examples
///
/// ```
/// use aaoifi_kb::chunking::{ChunkingConfig, chunk_text};
///
/// let config = ChunkingConfig::new(4, 1).unwrap();
/// let chunks = chunk_text("abcdefghij", config);
/// let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
/// assert_eq!(texts, ["abcd", "defg", "ghij", "j"]);
/// ```
pub fn chunk_text(text: &str, config: ChunkingConfig) -> Vec<Chunk> {
    // Build a map of char index -> byte index for O(1) lookups
    let char_to_byte: Vec<usize> = text
        .char_indices()
        .map(|(byte_idx, _)| byte_idx)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = char_to_byte.len() - 1;

    let step = config.step();
    let mut chunks = Vec::with_capacity(char_count.div_ceil(step));
    let mut start_char = 0;

    while start_char < char_count {
        let end_char = (start_char + config.chunk_size).min(char_count);
        let slice = &text[char_to_byte[start_char]..char_to_byte[end_char]];

        chunks.push(Chunk {
            text: slice.to_string(),
            index: chunks.len(),
            start_offset: start_char,
            page: page_marker(slice),
        });

        start_char += step;
    }

    chunks
}

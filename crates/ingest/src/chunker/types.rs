//! Chunk configuration and output types.

use serde::{Deserialize, Serialize};

// ── Configuration ───────────────────────────────────────────────────────────

/// Chunk size and overlap, both in characters (defaults: 800 / 150).
pub use wafrag_core::config::ChunkingConfig as ChunkConfig;

// ── Chunk output ────────────────────────────────────────────────────────────

/// A contiguous slice of one document's text with metadata for attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// URL or file path of the source document.
    pub origin: String,
    /// Page number carried over from the document (PDF only).
    pub page: Option<usize>,
    /// 0-based index within the document.
    pub index: usize,
    /// Character offset of the first character in the document text.
    pub char_offset: usize,
    /// The chunk text content.
    pub text: String,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

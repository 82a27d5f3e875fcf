//! Document splitting.

use thiserror::Error;
use wafrag_core::{ConfigError, Document};

use super::helpers::choose_cut;
use super::types::{Chunk, ChunkConfig};

#[derive(Debug, Error, PartialEq)]
pub enum ChunkError {
    #[error("Invalid chunking configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// Splits documents with one fixed (size, overlap) configuration.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    config: ChunkConfig,
}

impl Chunker {
    /// Fails when `chunk_size == 0` or `chunk_overlap >= chunk_size`.
    pub fn new(config: ChunkConfig) -> Result<Self, ChunkError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkConfig {
        self.config
    }

    /// Split one document into overlapping chunks.
    ///
    /// Each chunk holds at most `chunk_size` characters; consecutive chunks
    /// share exactly `chunk_overlap` characters, so dropping that prefix from
    /// every chunk after the first reproduces the text.
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        let chars: Vec<char> = doc.text.chars().collect();
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let remaining = chars.len() - start;
            let end = if remaining <= size {
                chars.len()
            } else {
                // Cuts at or before start+overlap would not advance.
                start + choose_cut(&chars[start..start + size], overlap)
            };

            chunks.push(Chunk {
                origin: doc.origin.clone(),
                page: doc.page,
                index: chunks.len(),
                char_offset: start,
                text: chars[start..end].iter().collect(),
            });

            if end == chars.len() {
                break;
            }
            start = end - overlap;
        }

        chunks
    }

    /// Chunk every document in order.
    pub fn chunk_documents(&self, docs: &[Document]) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = docs.iter().flat_map(|d| self.chunk_document(d)).collect();
        tracing::debug!(documents = docs.len(), chunks = chunks.len(), "Chunked documents");
        chunks
    }
}

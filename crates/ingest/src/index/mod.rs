//! Exact nearest-neighbour vector index over chunk embeddings.
//!
//! Built once per ingestion run, persisted to a directory as
//! `manifest.json` + `index.bin`, and reopened read-only for querying.

mod persist;
mod store;

use std::path::PathBuf;

use thiserror::Error;

use crate::embedding::{EmbeddingError, EmbeddingIdentity};

pub use persist::{IndexManifest, BLOB_FILE, FORMAT_VERSION, MANIFEST_FILE};
pub use store::{cosine_similarity, SearchHit, VectorIndex};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Cannot build an index from zero chunks")]
    Empty,

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector count {vectors} does not match chunk count {chunks}")]
    LengthMismatch { vectors: usize, chunks: usize },

    #[error("Vector dimension mismatch: index has {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },

    #[error("k must be at least 1")]
    ZeroK,

    #[error("No index found at {}; run wafrag-ingest first", .dir.display())]
    Missing { dir: PathBuf },

    #[error("Corrupt index at {}: {reason}; run wafrag-ingest to rebuild it", .dir.display())]
    Corrupt { dir: PathBuf, reason: String },

    #[error("Index was built with {stored} but the configured embedder is {configured}; re-run wafrag-ingest")]
    EmbeddingMismatch {
        stored: EmbeddingIdentity,
        configured: EmbeddingIdentity,
    },

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Missing, corrupt and mismatched indexes are all fixed by re-ingesting.
    pub fn needs_ingestion(&self) -> bool {
        matches!(
            self,
            Self::Missing { .. } | Self::Corrupt { .. } | Self::EmbeddingMismatch { .. }
        )
    }
}

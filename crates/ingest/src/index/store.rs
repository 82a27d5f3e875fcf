use std::sync::Arc;

use crate::chunker::Chunk;
use crate::embedding::{check_vectors, Embedder, EmbeddingBatcher, EmbeddingIdentity};

use super::IndexError;

/// One retrieved chunk with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk: Chunk,
    pub score: f32,
}

/// In-memory (vector, chunk) store with brute-force cosine search.
///
/// Entries keep insertion order; equal scores are returned in that order.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    identity: EmbeddingIdentity,
    chunks: Vec<Chunk>,
    vectors: Vec<Vec<f32>>,
    norms: Vec<f32>,
}

impl VectorIndex {
    /// Embed every chunk in batches and build the index.
    ///
    /// Fails on an empty chunk list or any embedding failure; nothing is
    /// skipped.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: Arc<dyn Embedder>,
        batch_size: usize,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::Empty);
        }

        let identity = embedder.identity();
        let batcher = EmbeddingBatcher::new(embedder, batch_size);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

        tracing::info!(
            chunks = chunks.len(),
            batch_size = batcher.batch_size(),
            embedder = %identity,
            "Embedding chunks"
        );
        let vectors = batcher.embed_all(&texts).await?;

        Self::from_parts(identity, chunks, vectors)
    }

    /// Assemble an index from precomputed vectors, validating shape.
    pub fn from_parts(
        identity: EmbeddingIdentity,
        chunks: Vec<Chunk>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::Empty);
        }
        if vectors.len() != chunks.len() {
            return Err(IndexError::LengthMismatch {
                vectors: vectors.len(),
                chunks: chunks.len(),
            });
        }
        check_vectors(&vectors, chunks.len(), identity.dimensions)?;

        let norms = vectors.iter().map(|v| l2_norm(v)).collect();
        Ok(Self {
            identity,
            chunks,
            vectors,
            norms,
        })
    }

    /// Up to `k` entries most similar to `query`, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if k == 0 {
            return Err(IndexError::ZeroK);
        }
        if query.len() != self.identity.dimensions {
            return Err(IndexError::Dimension {
                expected: self.identity.dimensions,
                actual: query.len(),
            });
        }

        let query_norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .zip(&self.norms)
            .enumerate()
            .map(|(i, (v, &norm))| (i, cosine_with_norms(query, query_norm, v, norm)))
            .collect();

        // Stable sort keeps insertion order among ties.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchHit {
                chunk: self.chunks[i].clone(),
                score,
            })
            .collect())
    }

    pub fn identity(&self) -> &EmbeddingIdentity {
        &self.identity
    }

    pub fn dimensions(&self) -> usize {
        self.identity.dimensions
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub(super) fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn cosine_with_norms(a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    dot / (norm_a * norm_b)
}

/// Cosine similarity; zero when either vector has zero length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine_with_norms(a, l2_norm(a), b, l2_norm(b))
}

use std::sync::Arc;

use super::traits::{check_vectors, Embedder, EmbeddingError};

/// Embeds a large list of texts in fixed-size batches, validating every
/// backend response.
pub struct EmbeddingBatcher {
    batch_size: usize,
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingBatcher {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            embedder,
        }
    }

    /// Embed all texts, returning one vector per text in input order.
    /// Any failed or malformed batch aborts the whole run.
    pub async fn embed_all(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let dims = self.embedder.dimensions();
        let total_batches = texts.len().div_ceil(self.batch_size);
        let mut vectors = Vec::with_capacity(texts.len());

        for (i, batch) in texts.chunks(self.batch_size).enumerate() {
            let embedded = self.embedder.embed_batch(batch).await?;
            check_vectors(&embedded, batch.len(), dims)?;
            vectors.extend(embedded);
            tracing::debug!(batch = i + 1, total_batches, "Embedded batch");
        }

        Ok(vectors)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

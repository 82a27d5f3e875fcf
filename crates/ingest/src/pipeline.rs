//! Offline ingestion: load → chunk → embed → persist.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use wafrag_core::{source_label, Document};

use crate::chunker::{Chunk, Chunker};
use crate::embedding::Embedder;
use crate::index::{IndexError, IndexManifest, VectorIndex};
use crate::loader::{aborted, DocumentLoader, Source};

/// Rows shown in the per-source chunk distribution.
pub const DISTRIBUTION_TOP_N: usize = 10;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("No sources configured")]
    NoSources,

    #[error("No documents could be loaded ({failed} sources failed)")]
    NoDocuments { failed: usize },

    #[error("Loaded documents produced no chunks")]
    NoChunks,

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// What happened to one configured source.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub origin: String,
    #[serde(flatten)]
    pub status: SourceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SourceStatus {
    Loaded { documents: usize },
    Failed { error: String },
}

/// Aggregate result of a successful ingestion run.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub sources: Vec<SourceOutcome>,
    pub documents: usize,
    pub chunks: usize,
    /// Mean chunk length in characters (rounded down).
    pub avg_chunk_chars: usize,
    /// Chunk count per source label, most chunks first.
    pub distribution: Vec<(String, usize)>,
    pub index_dir: PathBuf,
    pub manifest: IndexManifest,
}

impl IngestReport {
    pub fn failed(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.sources
            .iter()
            .filter(|s| matches!(s.status, SourceStatus::Failed { .. }))
    }

    pub fn top_sources(&self) -> &[(String, usize)] {
        let n = self.distribution.len().min(DISTRIBUTION_TOP_N);
        &self.distribution[..n]
    }

    pub fn log(&self) {
        let failed = self.failed().count();
        tracing::info!(
            sources = self.sources.len(),
            failed,
            documents = self.documents,
            chunks = self.chunks,
            avg_chunk_chars = self.avg_chunk_chars,
            index_dir = %self.index_dir.display(),
            "Ingestion complete"
        );
        for (rank, (label, count)) in self.top_sources().iter().enumerate() {
            tracing::info!("  {}. {}: {} chunks", rank + 1, label, count);
        }
        if self.distribution.len() > DISTRIBUTION_TOP_N {
            tracing::info!("  ... and {} more sources", self.distribution.len() - DISTRIBUTION_TOP_N);
        }
        for outcome in self.failed() {
            if let SourceStatus::Failed { error } = &outcome.status {
                tracing::warn!(origin = %outcome.origin, %error, "Source failed");
            }
        }
    }
}

/// Chunk counts per source label, descending; ties keep first-seen order.
pub fn chunk_distribution(chunks: &[Chunk]) -> Vec<(String, usize)> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for chunk in chunks {
        *counts.entry(source_label(&chunk.origin)).or_insert(0) += 1;
    }
    let mut rows: Vec<(String, usize)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1));
    rows
}

pub struct IngestionPipeline {
    loader: Arc<dyn DocumentLoader>,
    embedder: Arc<dyn Embedder>,
    chunker: Chunker,
    batch_size: usize,
    concurrency: usize,
}

impl IngestionPipeline {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        embedder: Arc<dyn Embedder>,
        chunker: Chunker,
        batch_size: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            loader,
            embedder,
            chunker,
            batch_size,
            concurrency: concurrency.max(1),
        }
    }

    /// Load every source with bounded concurrency. Documents keep source
    /// order; a failing or panicking source is recorded and skipped.
    pub async fn load_all(&self, sources: &[Source]) -> (Vec<Document>, Vec<SourceOutcome>) {
        let total = sources.len();
        let results: Vec<(String, Result<Vec<Document>, String>)> = stream::iter(sources.iter().enumerate())
            .map(|(i, source)| {
                let loader = Arc::clone(&self.loader);
                let source = source.clone();
                async move {
                    let origin = source.origin();
                    // Own task per source so a panicking loader fails only its source.
                    let task = tokio::spawn(async move { loader.load(&source).await });
                    let result = match task.await {
                        Ok(result) => result,
                        Err(e) => Err(aborted(&origin, e)),
                    };
                    match &result {
                        Ok(docs) => tracing::info!("[{}/{}] {} ({} docs)", i + 1, total, origin, docs.len()),
                        Err(e) => tracing::warn!("[{}/{}] {} failed: {}", i + 1, total, origin, e),
                    }
                    (origin, result.map_err(|e| e.to_string()))
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut documents = Vec::new();
        let mut outcomes = Vec::with_capacity(results.len());
        for (origin, result) in results {
            let status = match result {
                Ok(docs) => {
                    let status = SourceStatus::Loaded {
                        documents: docs.len(),
                    };
                    documents.extend(docs);
                    status
                }
                Err(error) => SourceStatus::Failed { error },
            };
            outcomes.push(SourceOutcome { origin, status });
        }
        (documents, outcomes)
    }

    /// Run the full pipeline and replace whatever index lives at `index_dir`.
    ///
    /// Fails only when nothing could be loaded, or when embedding or
    /// persisting the index fails.
    pub async fn run(&self, sources: &[Source], index_dir: &Path) -> Result<IngestReport, IngestError> {
        if sources.is_empty() {
            return Err(IngestError::NoSources);
        }

        tracing::info!(sources = sources.len(), concurrency = self.concurrency, "Loading sources");
        let (documents, outcomes) = self.load_all(sources).await;
        if documents.is_empty() {
            return Err(IngestError::NoDocuments {
                failed: outcomes.len(),
            });
        }

        let config = self.chunker.config();
        tracing::info!(
            documents = documents.len(),
            chunk_size = config.chunk_size,
            chunk_overlap = config.chunk_overlap,
            "Chunking documents"
        );
        let chunks = self.chunker.chunk_documents(&documents);
        if chunks.is_empty() {
            return Err(IngestError::NoChunks);
        }

        let total_chars: usize = chunks.iter().map(Chunk::char_len).sum();
        let avg_chunk_chars = total_chars / chunks.len();
        let distribution = chunk_distribution(&chunks);
        let chunk_count = chunks.len();

        let index = VectorIndex::build(chunks, Arc::clone(&self.embedder), self.batch_size).await?;
        let manifest = index.save(index_dir)?;

        Ok(IngestReport {
            sources: outcomes,
            documents: documents.len(),
            chunks: chunk_count,
            avg_chunk_chars,
            distribution,
            index_dir: index_dir.to_path_buf(),
            manifest,
        })
    }
}

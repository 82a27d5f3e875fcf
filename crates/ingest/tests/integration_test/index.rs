use std::sync::Arc;

use wafrag_core::config::ChunkingConfig;
use wafrag_core::Document;
use wafrag_ingest::embedding::{Embedder, EmbeddingIdentity};
use wafrag_ingest::index::IndexError;
use wafrag_ingest::{Chunker, VectorIndex};

use crate::helpers::{keyword_vector, test_index_dir, KeywordEmbedder};

fn corpus_chunks() -> Vec<wafrag_ingest::Chunk> {
    let chunker = Chunker::new(ChunkingConfig {
        chunk_size: 80,
        chunk_overlap: 20,
    })
    .unwrap();
    chunker.chunk_documents(&[
        Document::new(
            "https://example.com/security-pillar.html",
            "Security: apply identity controls everywhere. Security reviews catch drift. \
             Encrypt data at rest and in transit for security.",
        ),
        Document::new(
            "https://example.com/reliability-pillar.html",
            "Reliability comes from redundancy. Test reliability with game days and \
             recover automatically from failure.",
        ),
        Document::new(
            "./docs/sustainability.md",
            "Sustainability targets reduce waste. Measure sustainability impact per workload.",
        ),
    ])
}

#[tokio::test]
async fn test_build_save_load_search_roundtrip() {
    let dir = test_index_dir();
    let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder::new());
    let chunks = corpus_chunks();
    let n = chunks.len();

    let built = VectorIndex::build(chunks, embedder.clone(), 2).await.unwrap();
    assert_eq!(built.len(), n);
    built.save(&dir).unwrap();

    let loaded = VectorIndex::open(&dir, &embedder.identity()).unwrap();
    for query in ["security identity", "reliability", "sustainability waste", "unrelated"] {
        let q = keyword_vector(query);
        assert_eq!(built.search(&q, 5).unwrap(), loaded.search(&q, 5).unwrap(), "query {query}");
    }

    let top = loaded.search(&keyword_vector("reliability"), 1).unwrap();
    assert_eq!(top[0].chunk.origin, "https://example.com/reliability-pillar.html");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_build_rejects_empty_chunks() {
    let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder::new());
    let err = VectorIndex::build(Vec::new(), embedder, 8).await.unwrap_err();
    assert!(matches!(err, IndexError::Empty));
}

#[tokio::test]
async fn test_open_with_different_dimensions_fails() {
    let dir = test_index_dir();
    let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder::new());
    VectorIndex::build(corpus_chunks(), embedder.clone(), 8)
        .await
        .unwrap()
        .save(&dir)
        .unwrap();

    let mut other = embedder.identity();
    other.dimensions += 1;
    let err = VectorIndex::open(&dir, &other).unwrap_err();
    assert!(matches!(err, IndexError::EmbeddingMismatch { .. }));
    assert!(err.needs_ingestion());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_open_missing_index() {
    let err = VectorIndex::open(
        &test_index_dir(),
        &EmbeddingIdentity::new("openai", "text-embedding-3-small", 1536),
    )
    .unwrap_err();
    assert!(matches!(err, IndexError::Missing { .. }));
}

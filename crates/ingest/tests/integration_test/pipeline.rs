use std::sync::atomic::Ordering;
use std::sync::Arc;

use wafrag_core::config::ChunkingConfig;
use wafrag_ingest::index::IndexError;
use wafrag_ingest::pipeline::{IngestError, SourceStatus};
use wafrag_ingest::{Chunker, IngestionPipeline, VectorIndex};

use crate::helpers::{keyword_vector, test_index_dir, url, FailingEmbedder, KeywordEmbedder, MapLoader};

const IOT: &str = "IoT devices need a unique identity. Rotate device credentials. \
                   Security of iot fleets starts with identity.";
const COST: &str = "Cost optimization means paying only for what you use. \
                    Right-size instances and review cost reports weekly.";

fn pipeline(loader: MapLoader, embedder: Arc<KeywordEmbedder>, concurrency: usize) -> IngestionPipeline {
    let chunker = Chunker::new(ChunkingConfig {
        chunk_size: 60,
        chunk_overlap: 10,
    })
    .unwrap();
    IngestionPipeline::new(Arc::new(loader), embedder, chunker, 4, concurrency)
}

#[tokio::test]
async fn test_full_pipeline() {
    let dir = test_index_dir();
    let iot = url("iot-lens");
    let cost = url("cost-lens");
    let loader = MapLoader::default()
        .with(&iot.origin(), IOT)
        .with(&cost.origin(), COST);
    let embedder = Arc::new(KeywordEmbedder::new());

    let report = pipeline(loader, embedder.clone(), 2)
        .run(&[iot.clone(), cost.clone()], &dir)
        .await
        .unwrap();

    assert_eq!(report.documents, 2);
    assert!(report.chunks >= 4, "60-char chunks should split both pages");
    assert!(report.avg_chunk_chars <= 60);
    assert_eq!(report.failed().count(), 0);
    assert_eq!(report.manifest.chunk_count, report.chunks);
    assert!(embedder.calls.load(Ordering::SeqCst) >= 1);

    let labels: Vec<&str> = report.distribution.iter().map(|(l, _)| l.as_str()).collect();
    assert!(labels.contains(&"Iot Lens"));
    assert!(labels.contains(&"Cost Lens"));

    // The persisted index answers keyword queries.
    let index = VectorIndex::load(&dir).unwrap();
    let hits = index.search(&keyword_vector("cost"), 2).unwrap();
    assert!(hits.iter().all(|h| h.chunk.origin == cost.origin()));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_failed_sources_are_recorded_not_fatal() {
    let dir = test_index_dir();
    let iot = url("iot-lens");
    let missing = url("missing-lens");
    let loader = MapLoader::default().with(&iot.origin(), IOT);

    let report = pipeline(loader, Arc::new(KeywordEmbedder::new()), 4)
        .run(&[missing.clone(), iot.clone()], &dir)
        .await
        .unwrap();

    assert_eq!(report.documents, 1);
    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].origin, missing.origin());
    assert!(matches!(&failed[0].status, SourceStatus::Failed { error } if error.contains("404")));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_panicking_source_is_isolated() {
    let dir = test_index_dir();
    let iot = url("iot-lens");
    let broken = url("broken-lens");
    let cost = url("cost-lens");
    let loader = MapLoader::default()
        .with(&iot.origin(), IOT)
        .with(&broken.origin(), IOT)
        .with(&cost.origin(), COST)
        .panicking(&broken.origin());

    let report = pipeline(loader, Arc::new(KeywordEmbedder::new()), 3)
        .run(&[iot.clone(), broken.clone(), cost.clone()], &dir)
        .await
        .unwrap();

    assert_eq!(report.documents, 2);
    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].origin, broken.origin());
    assert!(matches!(
        &failed[0].status,
        SourceStatus::Failed { error } if error.contains("panicked") && error.contains("font encoding")
    ));

    let index = VectorIndex::load(&dir).unwrap();
    let origins: Vec<&str> = index.chunks().iter().map(|c| c.origin.as_str()).collect();
    assert!(origins.contains(&iot.origin().as_str()));
    assert!(origins.contains(&cost.origin().as_str()));
    assert!(!origins.contains(&broken.origin().as_str()));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_zero_documents_fails_run() {
    let dir = test_index_dir();
    let err = pipeline(MapLoader::default(), Arc::new(KeywordEmbedder::new()), 2)
        .run(&[url("a-lens"), url("b-lens")], &dir)
        .await
        .unwrap_err();

    assert!(matches!(err, IngestError::NoDocuments { failed: 2 }));
    assert!(!dir.exists(), "nothing may be written when the run fails");
}

#[tokio::test]
async fn test_no_sources_is_an_error() {
    let err = pipeline(MapLoader::default(), Arc::new(KeywordEmbedder::new()), 2)
        .run(&[], &test_index_dir())
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::NoSources));
}

#[tokio::test]
async fn test_embedding_failure_fails_run() {
    let dir = test_index_dir();
    let iot = url("iot-lens");
    let loader = MapLoader::default().with(&iot.origin(), IOT);
    let chunker = Chunker::new(ChunkingConfig::default()).unwrap();
    let pipeline = IngestionPipeline::new(Arc::new(loader), Arc::new(FailingEmbedder), chunker, 8, 1);

    let err = pipeline.run(&[iot], &dir).await.unwrap_err();
    assert!(matches!(err, IngestError::Index(IndexError::Embedding(_))));
    assert!(!dir.exists());
}

#[tokio::test]
async fn test_concurrent_loading_preserves_source_order() {
    let a = url("a-lens");
    let b = url("b-lens");
    let c = url("c-lens");
    // First source finishes last.
    let loader = MapLoader::default()
        .with(&a.origin(), "alpha")
        .with(&b.origin(), "bravo")
        .with(&c.origin(), "charlie")
        .delayed(&a.origin(), 50)
        .delayed(&b.origin(), 20);

    let (docs, outcomes) = pipeline(loader, Arc::new(KeywordEmbedder::new()), 3)
        .load_all(&[a.clone(), b.clone(), c.clone()])
        .await;

    let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
    assert_eq!(texts, vec!["alpha", "bravo", "charlie"]);
    let origins: Vec<String> = outcomes.iter().map(|o| o.origin.clone()).collect();
    assert_eq!(origins, vec![a.origin(), b.origin(), c.origin()]);
}

#[tokio::test]
async fn test_rerun_replaces_index() {
    let dir = test_index_dir();
    let iot = url("iot-lens");
    let cost = url("cost-lens");

    let both = MapLoader::default()
        .with(&iot.origin(), IOT)
        .with(&cost.origin(), COST);
    pipeline(both, Arc::new(KeywordEmbedder::new()), 2)
        .run(&[iot.clone(), cost.clone()], &dir)
        .await
        .unwrap();

    let only_cost = MapLoader::default().with(&cost.origin(), COST);
    let report = pipeline(only_cost, Arc::new(KeywordEmbedder::new()), 2)
        .run(&[cost.clone()], &dir)
        .await
        .unwrap();

    let index = VectorIndex::load(&dir).unwrap();
    assert_eq!(index.len(), report.chunks);
    assert!(index.chunks().iter().all(|c| c.origin == cost.origin()));

    std::fs::remove_dir_all(&dir).ok();
}

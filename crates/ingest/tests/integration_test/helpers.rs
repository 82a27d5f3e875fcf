use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use wafrag_core::Document;
use wafrag_ingest::embedding::{Embedder, EmbeddingError, EmbeddingIdentity};
use wafrag_ingest::loader::{DocumentLoader, LoadError, Source};

/// Create a unique temp directory path for each test (not created).
pub fn test_index_dir() -> PathBuf {
    std::env::temp_dir().join(format!("wafrag-test-{}", Uuid::new_v4()))
}

/// Vocabulary of the keyword embedder; one dimension per word.
pub const VOCAB: &[&str] = &[
    "security", "reliability", "cost", "performance", "operational", "sustainability", "iot",
    "devices", "identity",
];

/// Deterministic bag-of-words embedder: dimension `i` counts `VOCAB[i]`.
pub struct KeywordEmbedder {
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    VOCAB
        .iter()
        .map(|v| words.iter().filter(|w| *w == v).count() as f32)
        .collect()
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn identity(&self) -> EmbeddingIdentity {
        EmbeddingIdentity::new("test", "keywords", VOCAB.len())
    }
}

/// Embedder whose every call fails.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Api("503: upstream unavailable".into()))
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn identity(&self) -> EmbeddingIdentity {
        EmbeddingIdentity::new("test", "failing", VOCAB.len())
    }
}

/// In-memory loader: known origins return their text, anything else fails.
/// An optional per-origin delay lets tests scramble completion order, and
/// origins marked with `panicking` blow up the way a broken extractor does.
#[derive(Default)]
pub struct MapLoader {
    pub pages: HashMap<String, String>,
    pub delays_ms: HashMap<String, u64>,
    pub panics: Vec<String>,
}

impl MapLoader {
    pub fn with(mut self, origin: &str, text: &str) -> Self {
        self.pages.insert(origin.to_string(), text.to_string());
        self
    }

    pub fn delayed(mut self, origin: &str, ms: u64) -> Self {
        self.delays_ms.insert(origin.to_string(), ms);
        self
    }

    pub fn panicking(mut self, origin: &str) -> Self {
        self.panics.push(origin.to_string());
        self
    }
}

#[async_trait]
impl DocumentLoader for MapLoader {
    async fn load(&self, source: &Source) -> Result<Vec<Document>, LoadError> {
        let origin = source.origin();
        if let Some(ms) = self.delays_ms.get(&origin) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
        if self.panics.contains(&origin) {
            panic!("unsupported font encoding in {origin}");
        }
        match self.pages.get(&origin) {
            Some(text) => Ok(vec![Document::new(origin, text.clone())]),
            None => Err(LoadError::Status {
                url: origin,
                status: 404,
            }),
        }
    }
}

pub fn url(name: &str) -> Source {
    Source::Url(format!(
        "https://docs.aws.amazon.com/wellarchitected/latest/{name}/{name}.html"
    ))
}

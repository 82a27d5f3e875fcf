pub mod batcher;
pub mod ollama;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use wafrag_core::Config;

pub use batcher::EmbeddingBatcher;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use traits::{check_vectors, Embedder, EmbeddingError, EmbeddingIdentity};

/// Create the embedding backend selected by config.
pub fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    let embedding = &config.embedding;
    match embedding.provider.as_str() {
        "openai" => {
            let api_key = config
                .llm
                .openai_api_key
                .as_ref()
                .ok_or_else(|| EmbeddingError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            Ok(Arc::new(OpenAiEmbedder::new(
                api_key.clone(),
                embedding.model.clone(),
                config.llm.openai_base_url.clone(),
                embedding.dimensions,
            )))
        }
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(
            config.ollama.url.clone(),
            config.ollama.embedding_model.clone(),
            embedding.dimensions,
        ))),
        other => Err(EmbeddingError::NotConfigured(format!(
            "unknown embedding provider: '{other}'"
        ))),
    }
}

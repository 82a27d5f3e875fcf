use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use wafrag_ingest::embedding::{Embedder, EmbeddingError, EmbeddingIdentity};
use wafrag_ingest::{Chunk, VectorIndex};
use wafrag_llm::{
    AnswerEngine, EngineOptions, GenerationParams, LlmError, LlmProvider, Message, PromptTemplate,
    RagSession,
};

/// One dimension per word.
pub const VOCAB: &[&str] = &[
    "security", "reliability", "cost", "iot", "devices", "lens", "pillar", "weather",
];

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    VOCAB
        .iter()
        .map(|v| {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| w == v)
                .count() as f32
        })
        .collect()
}

pub struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn identity(&self) -> EmbeddingIdentity {
        EmbeddingIdentity::new("test", "keywords", VOCAB.len())
    }
}

/// Embedder for the same model as `KeywordEmbedder` whose API is unreachable.
pub struct UnreachableEmbedder;

#[async_trait]
impl Embedder for UnreachableEmbedder {
    async fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Api("503: upstream unavailable".into()))
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn identity(&self) -> EmbeddingIdentity {
        KeywordEmbedder.identity()
    }
}

pub const IOT_PDF: &str = "./docs/iot-lens.pdf";
pub const SECURITY_URL: &str =
    "https://docs.aws.amazon.com/wellarchitected/latest/security-pillar/welcome.html";
pub const COST_URL: &str =
    "https://docs.aws.amazon.com/wellarchitected/latest/cost-optimization-pillar/welcome.html";

fn chunk(origin: &str, index: usize, text: &str) -> Chunk {
    Chunk {
        origin: origin.to_string(),
        page: None,
        index,
        char_offset: 0,
        text: text.to_string(),
    }
}

/// Small corpus: two IoT chunks from one PDF, one security and one cost page.
pub fn corpus_index() -> Arc<VectorIndex> {
    let chunks = vec![
        chunk(IOT_PDF, 0, "The IoT lens covers devices at the edge."),
        chunk(IOT_PDF, 1, "IoT devices need security updates over the air."),
        chunk(SECURITY_URL, 0, "The security pillar protects data and systems."),
        chunk(COST_URL, 0, "The cost pillar avoids unnecessary cost."),
    ];
    let vectors = chunks.iter().map(|c| keyword_vector(&c.text)).collect();
    let index = VectorIndex::from_parts(KeywordEmbedder.identity(), chunks, vectors).unwrap();
    Arc::new(index)
}

/// What the stub model replies.
pub enum Reply {
    Text(String),
    /// Echo the answer policy: refuse when nothing relevant was retrieved.
    Policy,
    Hang,
    Fail(u16),
}

/// Language model stub that records every prompt it receives.
pub struct StubLlm {
    pub reply: Reply,
    pub prompts: Mutex<Vec<String>>,
}

impl StubLlm {
    pub fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmProvider for StubLlm {
    async fn complete(
        &self,
        messages: Vec<Message>,
        _params: &GenerationParams,
    ) -> Result<String, LlmError> {
        let prompt = messages
            .into_iter()
            .map(|m| m.content)
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt.clone());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Policy => {
                if prompt.contains("weather") {
                    Ok(wafrag_llm::prompt::REFUSAL.to_string())
                } else {
                    Ok(wafrag_llm::prompt::INSUFFICIENT.to_string())
                }
            }
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
            Reply::Fail(status) => Err(LlmError::ApiError {
                status: *status,
                body: "upstream".into(),
            }),
        }
    }

    fn model(&self) -> &str {
        "stub"
    }
}

pub fn engine(llm: Arc<StubLlm>, top_k: usize) -> AnswerEngine {
    engine_with(Arc::new(KeywordEmbedder), llm, top_k)
}

pub fn engine_with(embedder: Arc<dyn Embedder>, llm: Arc<StubLlm>, top_k: usize) -> AnswerEngine {
    let session = RagSession::new(embedder, corpus_index(), llm).unwrap();
    let options = EngineOptions {
        top_k,
        timeout: Duration::from_secs(5),
        ..EngineOptions::default()
    };
    AnswerEngine::new(session, PromptTemplate::builtin().unwrap(), options).unwrap()
}

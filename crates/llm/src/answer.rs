//! Retrieval-augmented answering: retrieve → prompt → generate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use wafrag_core::{Config, ConfigError};
use wafrag_ingest::embedding::{create_embedder, Embedder, EmbeddingError};
use wafrag_ingest::{IndexError, SearchHit, VectorIndex};

use crate::attribution::{attribute, render_with_footer, SourceRef};
use crate::prompt::{build_context, PromptError, PromptTemplate};
use crate::provider::{GenerationParams, LlmError, LlmProvider};
use crate::providers::create_provider;

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("Please enter a question")]
    EmptyQuestion,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Language model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Language model did not answer within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl AnswerError {
    /// The same question may succeed if asked again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnswerError::Timeout(_) => true,
            AnswerError::Llm(e) => e.is_transient(),
            AnswerError::Embedding(e) => matches!(e, EmbeddingError::Http(_) | EmbeddingError::Api(_)),
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AnswerError::Timeout(_) | AnswerError::Llm(LlmError::Timeout))
    }

    /// One line telling the user what to check.
    pub fn remediation_hint(&self) -> &'static str {
        match self {
            AnswerError::EmptyQuestion => "Type a question about the AWS Well-Architected Framework.",
            AnswerError::Index(e) if e.needs_ingestion() => {
                "Run wafrag-ingest to build the vector index, then try again."
            }
            AnswerError::Llm(e) if e.is_auth() => "Check that the LLM API key is valid.",
            AnswerError::Embedding(EmbeddingError::NotConfigured(_)) => {
                "Check that the embedding API key is set."
            }
            AnswerError::Timeout(_) | AnswerError::Llm(LlmError::Timeout) => {
                "The model took too long to respond; try again."
            }
            AnswerError::Config(_) | AnswerError::Prompt(_) => {
                "Check the environment configuration and prompt template."
            }
            _ => "Check that the vector index exists and the API key is valid.",
        }
    }
}

// ── Session ─────────────────────────────────────────────────────────

/// Handles shared by every query: the embedder, the read-only index and the
/// language model. Cheap to clone.
#[derive(Clone)]
pub struct RagSession {
    embedder: Arc<dyn Embedder>,
    index: Arc<VectorIndex>,
    llm: Arc<dyn LlmProvider>,
}

impl RagSession {
    /// Fails when the index was embedded with a different model than `embedder`.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<VectorIndex>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self, AnswerError> {
        let configured = embedder.identity();
        if index.identity() != &configured {
            return Err(IndexError::EmbeddingMismatch {
                stored: index.identity().clone(),
                configured,
            }
            .into());
        }
        Ok(Self {
            embedder,
            index,
            llm,
        })
    }

    /// Build the configured providers and open the persisted index.
    pub fn open(config: &Config) -> Result<Self, AnswerError> {
        config.validate_for_query()?;
        let embedder = create_embedder(config)?;
        let index = VectorIndex::open(&config.retrieval.index_dir, &embedder.identity())?;
        let llm = create_provider(&config.llm, &config.ollama)?;
        info!(
            chunks = index.len(),
            embedder = %embedder.identity(),
            model = llm.model(),
            "Opened RAG session"
        );
        Self::new(embedder, Arc::new(index), llm)
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }
}

// ── Engine ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub top_k: usize,
    pub params: GenerationParams,
    pub timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            top_k: 7,
            params: GenerationParams::default(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            params: GenerationParams::from(&config.llm),
            timeout: Duration::from_secs(config.llm.timeout_secs),
        }
    }
}

/// A generated answer with the chunks it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub question: String,
    pub text: String,
    #[serde(skip)]
    pub hits: Vec<SearchHit>,
    pub sources: Vec<SourceRef>,
}

impl Answer {
    /// Answer text plus the markdown sources footer.
    pub fn rendered(&self) -> String {
        render_with_footer(&self.text, &self.sources)
    }
}

pub struct AnswerEngine {
    session: RagSession,
    prompt: PromptTemplate,
    options: EngineOptions,
}

impl AnswerEngine {
    pub fn new(
        session: RagSession,
        prompt: PromptTemplate,
        options: EngineOptions,
    ) -> Result<Self, AnswerError> {
        if options.top_k == 0 {
            return Err(ConfigError::NonPositiveTopK(0).into());
        }
        Ok(Self {
            session,
            prompt,
            options,
        })
    }

    /// Open the session and prompt template described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, AnswerError> {
        let session = RagSession::open(config)?;
        let prompt = PromptTemplate::load(config.retrieval.prompt_template_path.as_deref())?;
        Self::new(session, prompt, EngineOptions::from_config(config))
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn session(&self) -> &RagSession {
        &self.session
    }

    /// Top-k chunks for `question`.
    pub async fn retrieve(&self, question: &str) -> Result<Vec<SearchHit>, AnswerError> {
        let query = self.session.embedder.embed(question).await?;
        Ok(self.session.index.search(&query, self.options.top_k)?)
    }

    /// Answer one question from the indexed corpus.
    pub async fn ask(&self, question: &str) -> Result<Answer, AnswerError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnswerError::EmptyQuestion);
        }
        let started = Instant::now();

        debug!(top_k = self.options.top_k, "Retrieving context");
        let hits = self.retrieve(question).await?;

        debug!(hits = hits.len(), "Rendering prompt");
        let prompt = self.prompt.render(&build_context(&hits), question)?;

        debug!(model = self.session.model(), "Generating answer");
        let generation = self.session.llm.generate(&prompt, &self.options.params);
        let text = match tokio::time::timeout(self.options.timeout, generation).await {
            Ok(result) => result?,
            Err(_) => return Err(AnswerError::Timeout(self.options.timeout)),
        };

        let sources = attribute(&hits);
        info!(
            hits = hits.len(),
            sources = sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Answered question"
        );

        Ok(Answer {
            question: question.to_string(),
            text: text.trim().to_string(),
            hits,
            sources,
        })
    }
}

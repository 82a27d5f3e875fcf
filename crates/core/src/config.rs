use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
/// Returns the resolved key name alongside the value for error reporting.
fn profiled_lookup(profile: &str, key: &str) -> Option<(String, String)> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some((prefixed, v));
        }
    }
    env_opt(key).map(|v| (key.to_string(), v))
}

fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    profiled_lookup(profile, key).map(|(_, v)| v)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Parse a profiled env var, failing on malformed values instead of
/// silently falling back to the default.
fn profiled_env_parse<T>(profile: &str, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match profiled_lookup(profile, key) {
        None => Ok(default),
        Some((resolved, raw)) => match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(e) => Err(ConfigError::Invalid {
                key: resolved,
                reason: e.to_string(),
                value: raw,
            }),
        },
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub embedding: EmbeddingConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub ingest: IngestConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `WAFRAG_PROFILE`. When set (e.g. `PROD`), every
    /// key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let profile = env_or("WAFRAG_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self, ConfigError> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            llm: LlmConfig::from_env_profiled(p)?,
            ollama: OllamaConfig::from_env_profiled(p),
            embedding: EmbeddingConfig::from_env_profiled(p)?,
            chunking: ChunkingConfig::from_env_profiled(p)?,
            retrieval: RetrievalConfig::from_env_profiled(p)?,
            ingest: IngestConfig::from_env_profiled(p)?,
            server: ServerConfig::from_env_profiled(p)?,
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Checks required before an ingestion run: chunk parameters and the
    /// embedding provider's credentials.
    pub fn validate_for_ingest(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;
        self.embedding.validate(&self.llm)?;
        if self.ingest.fetch_concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "FETCH_CONCURRENCY".into(),
                value: "0".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Checks required before serving queries: embedding and LLM credentials.
    pub fn validate_for_query(&self) -> Result<(), ConfigError> {
        self.embedding.validate(&self.llm)?;
        self.llm.validate()
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  llm:         provider={}, model={}", self.llm.provider, self.llm.model_name(&self.ollama));
        tracing::info!("  embedding:   provider={}, model={}, dims={}", self.embedding.provider, self.embedding.model_name(&self.ollama), self.embedding.dimensions);
        tracing::info!("  chunking:    size={}, overlap={}", self.chunking.chunk_size, self.chunking.chunk_overlap);
        tracing::info!("  retrieval:   top_k={}, index_dir={}", self.retrieval.top_k, self.retrieval.index_dir.display());
        tracing::info!("  ingest:      sources={}, concurrency={}", self.ingest.sources_path.display(), self.ingest.fetch_concurrency);
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "llm": {
                "provider": self.llm.provider,
                "model": self.llm.model_name(&self.ollama),
                "temperature": self.llm.temperature,
                "configured": self.llm.is_configured(),
            },
            "embedding": {
                "provider": self.embedding.provider,
                "model": self.embedding.model_name(&self.ollama),
                "dimensions": self.embedding.dimensions,
            },
            "retrieval": {
                "top_k": self.retrieval.top_k,
                "index_dir": self.retrieval.index_dir,
            },
        })
    }
}

// ── LLM (OpenAI / Anthropic / Ollama) ─────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai", "anthropic", "ollama"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl LlmConfig {
    fn from_env_profiled(p: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            provider: profiled_env_or(p, "LLM_PROVIDER", "openai").to_lowercase(),
            openai_api_key: profiled_env_opt(p, "OPENAI_API_KEY"),
            openai_model: profiled_env_or(p, "OPENAI_MODEL", "gpt-3.5-turbo"),
            openai_base_url: profiled_env_opt(p, "OPENAI_BASE_URL"),
            anthropic_api_key: profiled_env_opt(p, "ANTHROPIC_API_KEY"),
            anthropic_model: profiled_env_or(p, "ANTHROPIC_MODEL", "claude-sonnet-4-5-20250929"),
            temperature: profiled_env_parse(p, "LLM_TEMPERATURE", 0.1)?,
            max_tokens: profiled_env_parse(p, "LLM_MAX_TOKENS", 1024)?,
            timeout_secs: profiled_env_parse(p, "LLM_TIMEOUT_SECS", 60)?,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.provider.as_str() {
            "openai" if self.openai_api_key.is_none() => {
                Err(ConfigError::Missing("OPENAI_API_KEY".into()))
            }
            "anthropic" | "claude" if self.anthropic_api_key.is_none() => {
                Err(ConfigError::Missing("ANTHROPIC_API_KEY".into()))
            }
            "openai" | "anthropic" | "claude" | "ollama" => Ok(()),
            other => Err(ConfigError::UnknownProvider {
                kind: "LLM",
                name: other.to_string(),
            }),
        }
    }

    pub fn model_name<'a>(&'a self, ollama: &'a OllamaConfig) -> &'a str {
        match self.provider.as_str() {
            "anthropic" | "claude" => &self.anthropic_model,
            "ollama" => &ollama.model,
            _ => &self.openai_model,
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub embedding_model: String,
}

impl OllamaConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_or(p, "OLLAMA_URL", "http://localhost:11434"),
            model: profiled_env_or(p, "OLLAMA_MODEL", "llama3.2"),
            embedding_model: profiled_env_or(p, "OLLAMA_EMBEDDING_MODEL", "nomic-embed-text"),
        }
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "openai", "ollama"
    pub provider: String,
    /// Model for the OpenAI-compatible backend.
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
}

impl EmbeddingConfig {
    fn from_env_profiled(p: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            provider: profiled_env_or(p, "EMBEDDING_PROVIDER", "openai").to_lowercase(),
            model: profiled_env_or(p, "EMBEDDING_MODEL", "text-embedding-3-small"),
            dimensions: profiled_env_parse(p, "EMBEDDING_DIMENSIONS", 1536)?,
            batch_size: profiled_env_parse(p, "EMBEDDING_BATCH_SIZE", 64)?,
        })
    }

    pub fn validate(&self, llm: &LlmConfig) -> Result<(), ConfigError> {
        match self.provider.as_str() {
            "openai" if llm.openai_api_key.is_none() => {
                Err(ConfigError::Missing("OPENAI_API_KEY".into()))
            }
            "openai" | "ollama" => Ok(()),
            other => Err(ConfigError::UnknownProvider {
                kind: "embedding",
                name: other.to_string(),
            }),
        }
    }

    pub fn model_name<'a>(&'a self, ollama: &'a OllamaConfig) -> &'a str {
        match self.provider.as_str() {
            "ollama" => &ollama.embedding_model,
            _ => &self.model,
        }
    }
}

// ── Chunking ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of one document.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 150,
        }
    }
}

impl ChunkingConfig {
    fn from_env_profiled(p: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            chunk_size: profiled_env_parse(p, "CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: profiled_env_parse(p, "CHUNK_OVERLAP", defaults.chunk_overlap)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::ChunkOverlap {
                overlap: self.chunk_overlap,
                size: self.chunk_size,
            });
        }
        Ok(())
    }
}

// ── Retrieval ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub index_dir: PathBuf,
    /// Optional replacement for the built-in answer prompt.
    pub prompt_template_path: Option<PathBuf>,
}

impl RetrievalConfig {
    fn from_env_profiled(p: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            top_k: parse_top_k(profiled_env_parse(p, "TOP_K", 7i64)?)?,
            index_dir: PathBuf::from(profiled_env_or(p, "INDEX_DIR", "vectorstore")),
            prompt_template_path: profiled_env_opt(p, "PROMPT_TEMPLATE_PATH").map(PathBuf::from),
        })
    }
}

/// Reject zero or negative neighbour counts.
pub fn parse_top_k(raw: i64) -> Result<usize, ConfigError> {
    if raw <= 0 {
        return Err(ConfigError::NonPositiveTopK(raw));
    }
    usize::try_from(raw).map_err(|e| ConfigError::Invalid {
        key: "TOP_K".into(),
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

// ── Ingest ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// TOML file listing the corpus; the built-in corpus is used when absent.
    pub sources_path: PathBuf,
    pub fetch_concurrency: usize,
}

impl IngestConfig {
    fn from_env_profiled(p: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            sources_path: PathBuf::from(profiled_env_or(p, "SOURCES_PATH", "config/sources.toml")),
            fetch_concurrency: profiled_env_parse(p, "FETCH_CONCURRENCY", 4)?,
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_parse(p, "PORT", 7860)?,
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        })
    }
}

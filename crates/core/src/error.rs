use thiserror::Error;

/// Startup-time configuration problems. Never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(String),

    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },

    #[error("chunk_overlap ({overlap}) must be less than chunk_size ({size})")]
    ChunkOverlap { overlap: usize, size: usize },

    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("top_k must be greater than zero, got {0}")]
    NonPositiveTopK(i64),

    #[error("unknown {kind} provider: '{name}'")]
    UnknownProvider { kind: &'static str, name: String },
}

use wafrag_core::Config;
use wafrag_llm::AnswerEngine;

/// Shared by every request. The engine is read-only after startup.
pub struct AppState {
    pub engine: AnswerEngine,
    /// Secret-free view of the startup configuration.
    pub config: serde_json::Value,
}

impl AppState {
    pub fn new(engine: AnswerEngine, config: &Config) -> Self {
        Self {
            engine,
            config: config.redacted_summary(),
        }
    }
}

pub mod answer;
pub mod attribution;
pub mod prompt;
pub mod provider;
pub mod providers;

pub use answer::{Answer, AnswerEngine, AnswerError, EngineOptions, RagSession};
pub use attribution::SourceRef;
pub use prompt::{PromptError, PromptTemplate};
pub use provider::{GenerationParams, LlmError, LlmProvider, Message, Role};

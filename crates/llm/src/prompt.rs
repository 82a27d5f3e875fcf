//! Answer prompt template.
//!
//! The prompt carries the whole answering policy: answer from the retrieved
//! context only, refuse off-domain questions with [`REFUSAL`], and admit
//! gaps with [`INSUFFICIENT`]. Rendering is minijinja with two variables,
//! `context` and `question`.

use std::path::{Path, PathBuf};

use minijinja::Environment;
use thiserror::Error;
use wafrag_ingest::SearchHit;

/// Fixed reply to questions outside AWS / cloud architecture.
pub const REFUSAL: &str = "I'm specialized in AWS Well-Architected Framework topics. Please ask questions about cloud architecture, AWS best practices, security, cost optimization, reliability, performance, or operational excellence.";

/// Fixed reply when the retrieved context does not cover an in-domain question.
pub const INSUFFICIENT: &str =
    "The provided AWS documents don't contain detailed information on this specific topic.";

/// Placeholders every answer template must contain exactly once.
pub const PLACEHOLDERS: [&str; 2] = ["context", "question"];

/// Built-in template.
pub const DEFAULT_TEMPLATE: &str = r#"You are an expert assistant for the AWS Well-Architected Framework.
Answer questions ONLY about AWS cloud architecture, best practices, and related technical topics.

**Critical Instructions:**
1. If the question is about AWS Well-Architected Framework, cloud architecture, or technical best practices:
   - Use ONLY information from the provided context
   - Provide detailed, structured answers with bullet points
   - Include specific AWS services when mentioned
   - Cite the source at the end

2. If the question is completely unrelated to AWS or cloud architecture (e.g., personal questions, general knowledge, non-technical topics):
   - Politely decline: "I'm specialized in AWS Well-Architected Framework topics. Please ask questions about cloud architecture, AWS best practices, security, cost optimization, reliability, performance, or operational excellence."

3. If the question is technical but context is insufficient:
   - State: "The provided AWS documents don't contain detailed information on this specific topic."

Context:
{{ context }}

Question: {{ question }}

Detailed Answer:"#;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Failed to read prompt template {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Prompt template does not parse: {0}")]
    Syntax(String),

    #[error("Prompt template must contain {{{{ {name} }}}} exactly once (found {count})")]
    Placeholder { name: &'static str, count: usize },

    #[error("Prompt rendering failed: {0}")]
    Render(String),
}

/// A validated answer template.
///
/// Templates are plain strings, so a fresh [`Environment`] is built per
/// render call.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    pub fn builtin() -> Result<Self, PromptError> {
        Self::from_source(DEFAULT_TEMPLATE)
    }

    /// Parse and validate a template: each placeholder exactly once.
    pub fn from_source(source: &str) -> Result<Self, PromptError> {
        for name in PLACEHOLDERS {
            let count = placeholder_count(source, name);
            if count != 1 {
                return Err(PromptError::Placeholder { name, count });
            }
        }

        build_env()
            .template_from_str(source)
            .map_err(|e| PromptError::Syntax(e.to_string()))?;
        Ok(Self {
            source: source.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, PromptError> {
        let source = std::fs::read_to_string(path).map_err(|source| PromptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let template = Self::from_source(&source)?;
        tracing::info!(path = %path.display(), "Loaded custom prompt template");
        Ok(template)
    }

    /// The file at `path` when given, the built-in template otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, PromptError> {
        match path {
            Some(p) => Self::from_file(p),
            None => Self::builtin(),
        }
    }

    pub fn render(&self, context: &str, question: &str) -> Result<String, PromptError> {
        build_env()
            .render_str(
                &self.source,
                minijinja::context! { context => context, question => question },
            )
            .map_err(|e| PromptError::Render(e.to_string()))
    }
}

fn build_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    env
}

/// Retrieved chunk texts in rank order, blank-line separated.
pub fn build_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|h| h.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Occurrences of `{{ name }}` (any inner whitespace) in `source`.
fn placeholder_count(source: &str, name: &str) -> usize {
    let mut count = 0;
    let mut rest = source;
    while let Some(open) = rest.find("{{") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            break;
        };
        if after[..close].trim().trim_matches('-').trim() == name {
            count += 1;
        }
        rest = &after[close + 2..];
    }
    count
}

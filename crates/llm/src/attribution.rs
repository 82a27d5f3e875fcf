//! Source attribution for answers.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use wafrag_core::source_label;
use wafrag_ingest::SearchHit;

/// Characters of chunk text kept as a snippet.
pub const SNIPPET_CHARS: usize = 120;

/// Labels listed in the chat-style sources footer.
pub const FOOTER_MAX_LABELS: usize = 5;

/// One distinct origin that supported an answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub label: String,
    pub origin: String,
    pub snippet: String,
}

/// Distinct origins of `hits` in first-seen (rank) order. The snippet comes
/// from the first chunk seen for each origin.
pub fn attribute(hits: &[SearchHit]) -> Vec<SourceRef> {
    let mut by_origin: IndexMap<&str, SourceRef> = IndexMap::new();
    for hit in hits {
        let origin = hit.chunk.origin.as_str();
        by_origin.entry(origin).or_insert_with(|| SourceRef {
            label: source_label(origin),
            origin: origin.to_string(),
            snippet: snippet(&hit.chunk.text),
        });
    }
    by_origin.into_values().collect()
}

/// First [`SNIPPET_CHARS`] characters with line breaks turned into spaces.
pub fn snippet(text: &str) -> String {
    text.chars()
        .take(SNIPPET_CHARS)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

/// Answer followed by a markdown footer of up to five distinct labels,
/// sorted alphabetically.
pub fn render_with_footer(answer: &str, sources: &[SourceRef]) -> String {
    let labels: BTreeSet<&str> = sources.iter().map(|s| s.label.as_str()).collect();
    if labels.is_empty() {
        return answer.to_string();
    }
    let lines: Vec<String> = labels
        .into_iter()
        .take(FOOTER_MAX_LABELS)
        .map(|l| format!("• {l}"))
        .collect();
    format!("{answer}\n\n---\n📚 **Sources:**\n{}", lines.join("\n"))
}

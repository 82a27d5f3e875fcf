use serde::{Deserialize, Serialize};

/// Origin identifier of a document: a URL or a local file path.
pub type Origin = String;

/// A loaded source document (or one page of it).
///
/// Loaders produce these, the chunker consumes them. The text is never
/// modified after loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// URL or file path the text came from.
    pub origin: Origin,
    /// 1-based page number for page-oriented formats (PDF).
    pub page: Option<usize>,
    pub text: String,
}

impl Document {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            page: None,
            text: text.into(),
        }
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }
}

/// Human-readable label for an origin: the last path segment without query
/// string or extension, `-`/`_` as spaces, title-cased.
///
/// `https://docs.aws.amazon.com/wellarchitected/latest/iot-lens/iot-lens.html?did=wp_card`
/// becomes `Iot Lens`.
pub fn source_label(origin: &str) -> String {
    let path = origin.split(['?', '#']).next().unwrap_or(origin);
    let segment = path
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or(path);
    let stem = match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    };

    stem.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_page_sets_page() {
        let doc = Document::new("lens.pdf", "text").with_page(3);
        assert_eq!(doc.page, Some(3));
        assert_eq!(doc.origin, "lens.pdf");
    }

    #[test]
    fn label_from_url_drops_query_and_extension() {
        assert_eq!(
            source_label("https://docs.aws.amazon.com/wellarchitected/latest/migration-lens/migration-lens.html?did=wp_card&trk=wp_card"),
            "Migration Lens"
        );
    }

    #[test]
    fn label_from_file_path() {
        assert_eq!(source_label("./docs/wellarchitected-machine-learning-lens.pdf"), "Wellarchitected Machine Learning Lens");
        assert_eq!(source_label("notes/cost_optimization.md"), "Cost Optimization");
    }

    #[test]
    fn label_handles_trailing_slash_and_bare_names() {
        assert_eq!(source_label("https://example.com/security-pillar/"), "Security Pillar");
        assert_eq!(source_label("README"), "Readme");
    }
}

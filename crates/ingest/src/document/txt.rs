use super::PageContent;

/// Plain text and Markdown: the whole file is a single unpaged entry.
pub fn extract_txt(bytes: &[u8]) -> Vec<PageContent> {
    // Try UTF-8 first, fall back to lossy conversion
    let text = String::from_utf8(bytes.to_vec())
        .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned());

    vec![PageContent {
        page_number: None,
        text: text.trim().to_string(),
    }]
}

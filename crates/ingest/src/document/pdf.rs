use super::{ExtractionError, PageContent};

/// Extract text from an in-memory PDF, one entry per page.
///
/// `pdf-extract` returns the whole document as one string with form feeds
/// (`\x0C`) between pages. A PDF without a text layer (scanned images)
/// yields no pages rather than an error; the loader reports it.
pub fn extract_pdf(bytes: &[u8]) -> Result<Vec<PageContent>, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        tracing::warn!("PDF has no extractable text layer");
        return Ok(Vec::new());
    }

    Ok(split_pages(&text))
}

fn split_pages(text: &str) -> Vec<PageContent> {
    if !text.contains('\x0C') {
        return vec![PageContent {
            page_number: Some(1),
            text: text.trim().to_string(),
        }];
    }

    // Page numbers follow the original position, so blank pages leave gaps.
    text.split('\x0C')
        .enumerate()
        .filter(|(_, page_text)| !page_text.trim().is_empty())
        .map(|(i, page_text)| PageContent {
            page_number: Some(i + 1),
            text: page_text.trim().to_string(),
        })
        .collect()
}

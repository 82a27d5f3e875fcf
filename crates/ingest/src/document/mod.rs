mod pdf;
mod txt;

use thiserror::Error;
use wafrag_core::Document;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
    #[error("HTML extraction failed: {0}")]
    HtmlError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A page of extracted text.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page number for PDFs, `None` for flat text.
    pub page_number: Option<usize>,
    /// The extracted text content.
    pub text: String,
}

/// Result of extracting text from a file or response body.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Origin identifier (path or URL).
    pub origin: String,
    /// File type: "pdf", "txt", "md", "html"
    pub file_type: String,
    /// Extracted pages with text.
    pub pages: Vec<PageContent>,
}

impl ExtractedDocument {
    /// One [`Document`] per non-empty page, all carrying this origin.
    pub fn into_documents(self) -> Vec<Document> {
        let origin = self.origin;
        self.pages
            .into_iter()
            .filter(|p| !p.text.trim().is_empty())
            .map(|p| Document {
                origin: origin.clone(),
                page: p.page_number,
                text: p.text,
            })
            .collect()
    }
}

/// Lowercased extension of a path or URL path, ignoring any query string.
pub fn file_type_of(name: &str) -> String {
    let path = name.split(['?', '#']).next().unwrap_or(name);
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => String::new(),
    }
}

/// Extract text from file bytes based on file type.
pub fn extract_text(bytes: &[u8], origin: &str) -> Result<ExtractedDocument, ExtractionError> {
    let file_type = file_type_of(origin);

    let pages = match file_type.as_str() {
        "pdf" => pdf::extract_pdf(bytes)?,
        "txt" | "text" | "md" | "markdown" => txt::extract_txt(bytes),
        other => return Err(ExtractionError::UnsupportedType(other.to_string())),
    };

    Ok(ExtractedDocument {
        origin: origin.to_string(),
        file_type,
        pages,
    })
}

/// Extract a PDF regardless of the origin's extension (e.g. a URL served
/// as `application/pdf`).
pub fn extract_pdf_bytes(bytes: &[u8], origin: &str) -> Result<ExtractedDocument, ExtractionError> {
    Ok(ExtractedDocument {
        origin: origin.to_string(),
        file_type: "pdf".to_string(),
        pages: pdf::extract_pdf(bytes)?,
    })
}

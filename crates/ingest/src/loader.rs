//! Corpus definition and document loading from local files and HTTP.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;
use wafrag_core::Document;

use crate::document::{self, ExtractedDocument, ExtractionError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction failed for {origin}: {source}")]
    Extraction {
        origin: String,
        #[source]
        source: ExtractionError,
    },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },

    #[error("No text could be extracted from {0}")]
    NoText(String),

    #[error("Loading {origin} aborted: {reason}")]
    Aborted { origin: String, reason: String },

    #[error("Invalid source list {}: {reason}", .path.display())]
    SourceList { path: PathBuf, reason: String },
}

// ── Source list ───────────────────────────────────────────────────────

/// One loadable source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Url(String),
}

impl Source {
    /// Origin identifier recorded on every document from this source.
    pub fn origin(&self) -> String {
        match self {
            Source::File(path) => path.display().to_string(),
            Source::Url(url) => url.clone(),
        }
    }
}

/// The corpus to ingest, as read from `sources.toml`.
///
/// ```toml
/// files = ["./docs/generative-ai-lens.pdf"]
/// directories = ["./notes"]
/// urls = ["https://docs.aws.amazon.com/wellarchitected/latest/iot-lens/iot-lens.html"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceList {
    pub files: Vec<PathBuf>,
    pub directories: Vec<PathBuf>,
    pub urls: Vec<String>,
}

const BUILTIN_PDFS: &[&str] = &[
    "./docs/wellarchitected-machine-learning-lens.pdf",
    "./docs/generative-ai-lens.pdf",
    "./docs/responsible-ai-lens.pdf",
];

const BUILTIN_URLS: &[&str] = &[
    "https://docs.aws.amazon.com/wellarchitected/latest/responsible-ai-lens/responsible-ai-lens.html",
    "https://docs.aws.amazon.com/wellarchitected/latest/generative-ai-lens/generative-ai-lens.html",
    "https://docs.aws.amazon.com/wellarchitected/latest/machine-learning-lens/machine-learning-lens.html",
    "https://docs.aws.amazon.com/wellarchitected/latest/modern-industrial-data-technology-lens/modern-industrial-data-technology-lens.html",
    "https://docs.aws.amazon.com/wellarchitected/latest/end-user-computing-lens/end-user-computing-lens.html",
    "https://docs.aws.amazon.com/wellarchitected/latest/supply-chain-lens/supply-chain-lens.html",
    "https://docs.aws.amazon.com/wellarchitected/latest/iot-lens/iot-lens.html",
    "https://docs.aws.amazon.com/wellarchitected/latest/high-performance-computing-lens/high-performance-computing-lens.html?did=wp_card&trk=wp_card",
    "https://docs.aws.amazon.com/wellarchitected/latest/mergers-and-acquisitions-lens/mergers-and-acquisitions-lens.html?did=wp_card&trk=wp_card",
    "https://docs.aws.amazon.com/wellarchitected/latest/migration-lens/migration-lens.html?did=wp_card&trk=wp_card",
    "https://docs.aws.amazon.com/wellarchitected/latest/government-lens/government-lens.html?did=wp_card&trk=wp_card",
    "https://docs.aws.amazon.com/wellarchitected/latest/connected-mobility-lens/connected-mobility-lens.html?did=wp_card&trk=wp_card",
    "https://docs.aws.amazon.com/wellarchitected/latest/analytics-lens/analytics-lens.html?did=wp_card&trk=wp_card",
];

/// Extensions picked up when expanding directories.
const DIRECTORY_EXTENSIONS: &[&str] = &["pdf", "txt", "md", "markdown"];

impl SourceList {
    /// Well-Architected lens PDFs under `./docs` plus the lens web pages.
    pub fn builtin() -> Self {
        Self {
            files: BUILTIN_PDFS.iter().map(PathBuf::from).collect(),
            directories: Vec::new(),
            urls: BUILTIN_URLS.iter().map(|u| u.to_string()).collect(),
        }
    }

    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, LoadError> {
        toml::from_str(raw).map_err(|e| LoadError::SourceList {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Read the list from `path`, or fall back to [`SourceList::builtin`]
    /// when the file does not exist.
    pub fn load_or_builtin(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Source list not found, using built-in corpus");
            return Ok(Self::builtin());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    /// Flatten into concrete sources: files, then directory contents
    /// (recursive, sorted by name), then URLs.
    pub fn expand(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self.files.iter().cloned().map(Source::File).collect();

        for dir in &self.directories {
            if !dir.is_dir() {
                tracing::warn!(dir = %dir.display(), "Source directory not found, skipping");
                continue;
            }
            for entry in WalkDir::new(dir).sort_by_file_name() {
                match entry {
                    Ok(e) if e.file_type().is_file() && has_loadable_extension(e.path()) => {
                        sources.push(Source::File(e.into_path()));
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "Skipping unreadable directory entry"),
                }
            }
        }

        sources.extend(self.urls.iter().cloned().map(Source::Url));
        sources
    }
}

fn has_loadable_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DIRECTORY_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

// ── Loading ───────────────────────────────────────────────────────────

/// Turns a [`Source`] into documents.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, source: &Source) -> Result<Vec<Document>, LoadError>;
}

/// Loads local files from disk and remote pages over HTTP.
pub struct SourceLoader {
    client: reqwest::Client,
}

impl SourceLoader {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .user_agent(concat!("wafrag/", env!("CARGO_PKG_VERSION")))
                .redirect(reqwest::redirect::Policy::limited(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    async fn load_file(&self, path: &Path) -> Result<Vec<Document>, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }
        let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let origin = path.display().to_string();
        let extract_origin = origin.clone();
        let extracted =
            extract_blocking(&origin, move || document::extract_text(&bytes, &extract_origin))
                .await?;
        into_non_empty(extracted)
    }

    async fn load_url(&self, url: &str) -> Result<Vec<Document>, LoadError> {
        let parsed = url::Url::parse(url).map_err(|e| LoadError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        let final_url = response.url().clone();
        let body = response.bytes().await?;

        let is_pdf =
            content_type.contains("application/pdf") || document::file_type_of(url) == "pdf";
        let origin = url.to_string();
        let extracted = extract_blocking(url, move || {
            if is_pdf {
                document::extract_pdf_bytes(&body, &origin)
            } else {
                extract_html(&body, &final_url, &origin)
            }
        })
        .await?;

        into_non_empty(extracted)
    }
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl DocumentLoader for SourceLoader {
    async fn load(&self, source: &Source) -> Result<Vec<Document>, LoadError> {
        match source {
            Source::File(path) => self.load_file(path).await,
            Source::Url(url) => self.load_url(url).await,
        }
    }
}

/// Readable text of an HTML page, keyed by the configured URL rather than
/// the post-redirect one so labels stay stable.
fn extract_html(
    body: &[u8],
    final_url: &url::Url,
    origin: &str,
) -> Result<ExtractedDocument, ExtractionError> {
    let mut cursor = Cursor::new(body);
    let product = readability::extractor::extract(&mut cursor, final_url)
        .map_err(|e| ExtractionError::HtmlError(e.to_string()))?;

    Ok(ExtractedDocument {
        origin: origin.to_string(),
        file_type: "html".to_string(),
        pages: vec![document::PageContent {
            page_number: None,
            text: product.text.trim().to_string(),
        }],
    })
}

/// Run a CPU-bound extractor on the blocking pool. A panicking extractor
/// fails this source only.
pub(crate) async fn extract_blocking<F>(origin: &str, extract: F) -> Result<ExtractedDocument, LoadError>
where
    F: FnOnce() -> Result<ExtractedDocument, ExtractionError> + Send + 'static,
{
    match tokio::task::spawn_blocking(extract).await {
        Ok(result) => result.map_err(|source| LoadError::Extraction {
            origin: origin.to_string(),
            source,
        }),
        Err(e) => Err(aborted(origin, e)),
    }
}

/// Turn a failed task into a per-source error, keeping the panic message.
pub(crate) fn aborted(origin: &str, e: tokio::task::JoinError) -> LoadError {
    let reason = if e.is_panic() {
        let payload = e.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|m| m.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        format!("panicked: {message}")
    } else {
        e.to_string()
    };
    LoadError::Aborted {
        origin: origin.to_string(),
        reason,
    }
}

fn into_non_empty(extracted: ExtractedDocument) -> Result<Vec<Document>, LoadError> {
    let origin = extracted.origin.clone();
    let docs = extracted.into_documents();
    if docs.is_empty() {
        return Err(LoadError::NoText(origin));
    }
    Ok(docs)
}

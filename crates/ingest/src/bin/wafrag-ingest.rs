//! wafrag-ingest: build the vector index from the configured corpus.
//!
//! Pipeline flow: sources → documents → chunks → embeddings → index dir
//!
//! Re-running replaces the previous index.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use wafrag_core::config::{load_dotenv, ChunkingConfig};
use wafrag_core::Config;
use wafrag_ingest::embedding::create_embedder;
use wafrag_ingest::{Chunker, IngestionPipeline, SourceList, SourceLoader};

// ── CLI ─────────────────────────────────────────────────────────────

/// Load AWS Well-Architected documents and build the vector index.
#[derive(Parser, Debug)]
#[command(name = "wafrag-ingest", version, about)]
struct Cli {
    /// TOML file listing files, directories and URLs to ingest.
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Directory the index is written to.
    #[arg(long)]
    index_dir: Option<PathBuf>,

    /// Maximum characters per chunk.
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Characters shared between consecutive chunks.
    #[arg(long)]
    chunk_overlap: Option<usize>,

    /// Sources fetched in parallel.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    fetch_timeout: u64,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.sources {
            config.ingest.sources_path = path.clone();
        }
        if let Some(dir) = &self.index_dir {
            config.retrieval.index_dir = dir.clone();
        }
        config.chunking = ChunkingConfig {
            chunk_size: self.chunk_size.unwrap_or(config.chunking.chunk_size),
            chunk_overlap: self.chunk_overlap.unwrap_or(config.chunking.chunk_overlap),
        };
        if let Some(n) = self.concurrency {
            config.ingest.fetch_concurrency = n;
        }
    }
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let mut config = Config::from_env().context("invalid configuration")?;
    cli.apply(&mut config);
    config.validate_for_ingest().context("invalid configuration")?;
    config.log_summary();

    let source_list = SourceList::load_or_builtin(&config.ingest.sources_path)?;
    let sources = source_list.expand();
    if sources.is_empty() {
        bail!(
            "no sources to ingest; add files, directories or urls to {}",
            config.ingest.sources_path.display()
        );
    }

    let embedder = create_embedder(&config).context("failed to create embedder")?;
    let chunker = Chunker::new(config.chunking)?;
    let loader = Arc::new(SourceLoader::new(Duration::from_secs(cli.fetch_timeout)));

    let pipeline = IngestionPipeline::new(
        loader,
        embedder,
        chunker,
        config.embedding.batch_size,
        config.ingest.fetch_concurrency,
    );

    let started = Instant::now();
    let report = pipeline
        .run(&sources, &config.retrieval.index_dir)
        .await
        .context("ingestion failed")?;
    report.log();

    info!(
        elapsed_secs = started.elapsed().as_secs(),
        "Index written to {}",
        report.index_dir.display()
    );
    Ok(())
}

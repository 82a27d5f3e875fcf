use std::path::PathBuf;

use clap::Parser;

/// Ask questions about the AWS Well-Architected Framework.
///
/// Answers come from the local vector index built by `wafrag-ingest`.
/// Without `--question` an interactive prompt is started.
#[derive(Parser, Debug)]
#[command(name = "wafrag", version, about = "AWS Well-Architected Framework Q&A")]
pub struct CliArgs {
    /// Answer a single question and exit
    #[arg(long, short)]
    pub question: Option<String>,

    /// Number of chunks retrieved per question (overrides TOP_K)
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Vector index directory (overrides INDEX_DIR)
    #[arg(long)]
    pub index_dir: Option<PathBuf>,
}

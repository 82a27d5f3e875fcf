mod cli;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use wafrag_core::config::load_dotenv;
use wafrag_core::Config;
use wafrag_llm::AnswerEngine;

use crate::cli::CliArgs;
use crate::terminal::{Input, Terminal};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let terminal = Terminal::new();

    let mut config = Config::from_env().context("invalid configuration")?;
    if let Some(k) = args.top_k {
        config.retrieval.top_k = k;
    }
    if let Some(dir) = &args.index_dir {
        config.retrieval.index_dir = dir.clone();
    }

    let engine = match AnswerEngine::from_config(&config) {
        Ok(engine) => engine,
        Err(e) => {
            terminal.print_error(&e.to_string(), e.remediation_hint())?;
            return Err(e).context("failed to start answer engine");
        }
    };

    if let Some(question) = args.question {
        let answer = engine.ask(&question).await.map_err(|e| {
            terminal.print_error(&e.to_string(), e.remediation_hint()).ok();
            e
        })?;
        terminal.display_answer(&answer)?;
        return Ok(());
    }

    terminal.print_banner(engine.session().model(), engine.session().index().len())?;

    loop {
        let question = match terminal.read_input()? {
            Input::Exit => {
                terminal.print_info("\n👋 Goodbye!")?;
                break;
            }
            Input::Empty => {
                terminal.print_warning("Please enter a question.")?;
                continue;
            }
            Input::Question(q) => q,
        };

        let spinner = terminal.start_spinner("🔍 Searching...")?;
        let result = engine.ask(&question).await;
        spinner.stop();

        match result {
            Ok(answer) => {
                info!(sources = answer.sources.len(), "Displayed answer");
                terminal.display_answer(&answer)?;
            }
            Err(e) => {
                error!(error = %e, retryable = e.is_retryable(), "Question failed");
                terminal.print_error(&e.to_string(), e.remediation_hint())?;
            }
        }
    }

    Ok(())
}

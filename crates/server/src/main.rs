//! wafrag-server: HTTP front end for the Well-Architected answer engine.

mod api;
mod router;
mod state;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use wafrag_core::config::load_dotenv;
use wafrag_core::Config;
use wafrag_llm::AnswerEngine;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let config = Config::from_env().context("invalid configuration")?;
    config.log_summary();

    let engine = AnswerEngine::from_config(&config).map_err(|e| {
        tracing::error!(error = %e, hint = e.remediation_hint(), "Failed to start answer engine");
        e
    })?;

    let state = Arc::new(AppState::new(engine, &config));
    let app = router::build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

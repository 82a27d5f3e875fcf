use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::warn;

use wafrag_llm::{AnswerError, SourceRef};

use crate::state::AppState;

// ── Health ────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub chunks: usize,
    pub model: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let session = state.engine.session();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        chunks: session.index().len(),
        model: session.model().to_string(),
    })
}

/// Active configuration with API keys left out.
pub async fn config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.config.clone())
}

// ── Ask ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    /// Answer plus the markdown sources footer, ready for a chat UI.
    pub rendered: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub hint: &'static str,
}

pub struct ApiError(AnswerError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AnswerError::EmptyQuestion => StatusCode::BAD_REQUEST,
            e if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<AnswerError> for ApiError {
    fn from(e: AnswerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.0.to_string(),
            hint: self.0.remediation_hint(),
        };
        (status, Json(body)).into_response()
    }
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let answer = state.engine.ask(&req.question).await.map_err(|e| {
        warn!(error = %e, retryable = e.is_retryable(), "Question failed");
        e
    })?;

    let rendered = answer.rendered();
    Ok(Json(AskResponse {
        answer: answer.text,
        sources: answer.sources,
        rendered,
    }))
}

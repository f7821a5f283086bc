//! HTTP request handlers

use super::state::AppState;
use crate::bot::Activity;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tera::Context;
use tracing::error;

/// Body of POST /api/rag
#[derive(Debug, Deserialize)]
pub struct RagRequest {
    pub query: Option<String>,
    #[serde(rename = "llamacloudData")]
    pub llamacloud_data: Option<serde_json::Value>,
}

/// Reply of POST /api/rag
#[derive(Debug, Serialize, Deserialize)]
pub struct RagResponse {
    pub response: String,
}

/// Task page handler
pub async fn index(State(state): State<AppState>) -> impl IntoResponse {
    let mut ctx = Context::new();
    ctx.insert("instance_name", state.instance_name());
    ctx.insert("version", crate::VERSION);

    match state.templates.render_with_context("index.html", &ctx) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

/// Bot Framework messaging endpoint.
///
/// The turn runs on its own task so the channel gets an immediate 202 and
/// never retries a slow turn into a duplicate reply.
pub async fn messages(State(state): State<AppState>, Json(activity): Json<Activity>) -> StatusCode {
    tracing::info!("Received a request to /api/messages");
    let bot = state.bot.clone();
    tokio::spawn(async move {
        if let Err(e) = bot.on_activity(activity).await {
            error!("Failed to process activity: {}", e);
        }
    });
    StatusCode::ACCEPTED
}

/// Direct RAG endpoint used by the task page
pub async fn rag(State(state): State<AppState>, Json(request): Json<RagRequest>) -> Response {
    let query = match request.query.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "query must not be empty"})),
            )
                .into_response()
        }
    };

    let response = state
        .orchestrator
        .handle_turn(&query, request.llamacloud_data)
        .await;

    Json(RagResponse { response }).into_response()
}

/// Stats handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot())
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}

//! Health and status endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Relay status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub version: &'static str,
    /// Number of live client sessions
    pub sessions: usize,
    /// "gemini" when a credential is configured, "mock" otherwise
    pub provider: &'static str,
    pub model: String,
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Relay status
async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
        sessions: state.relay.sessions().len().await,
        provider: state.relay.mode(),
        model: state.model.clone(),
    })
}

/// Build health router (liveness only, no state needed)
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Build status router (needs state for session count)
pub fn status_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/status", get(status))
        .with_state(state)
}

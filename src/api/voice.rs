//! Voice query and interrupt endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::relay::RelayError;

/// Build voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/interrupt", post(interrupt))
        .with_state(state)
}

/// Query request
///
/// Fields are kept loosely typed so that a wrong type is reported as a
/// missing field rather than rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub text: Option<serde_json::Value>,
    #[serde(default, rename = "clientId")]
    pub client_id: Option<serde_json::Value>,
}

/// Query response
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub ok: bool,
    pub text: String,
    #[serde(rename = "clientId")]
    pub client_id: String,
}

/// Interrupt request
#[derive(Debug, Default, Deserialize)]
pub struct InterruptRequest {
    #[serde(default, rename = "clientId")]
    pub client_id: Option<serde_json::Value>,
}

/// Interrupt response
#[derive(Debug, Serialize)]
pub struct InterruptResponse {
    pub ok: bool,
    pub interrupted: bool,
}

/// Answer a transcribed voice query
async fn query(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, VoiceError> {
    let request = body_or_default(payload);

    let reply = state
        .relay
        .query(as_str(request.text.as_ref()), as_str(request.client_id.as_ref()))
        .await?;

    Ok(Json(QueryResponse {
        ok: true,
        text: reply.reply,
        client_id: reply.client_id,
    }))
}

/// End a client's session
async fn interrupt(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<InterruptRequest>, JsonRejection>,
) -> Result<Json<InterruptResponse>, VoiceError> {
    let request = body_or_default(payload);

    state
        .relay
        .interrupt(as_str(request.client_id.as_ref()))
        .await?;

    Ok(Json(InterruptResponse {
        ok: true,
        interrupted: true,
    }))
}

/// Treat an unreadable body as an empty one
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> T {
    match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "unreadable request body");
            T::default()
        }
    }
}

/// String view of a JSON field; other types count as absent
fn as_str(value: Option<&serde_json::Value>) -> Option<&str> {
    value.and_then(serde_json::Value::as_str)
}

/// Voice API errors
#[derive(Debug)]
pub struct VoiceError(RelayError);

impl From<RelayError> for VoiceError {
    fn from(err: RelayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for VoiceError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            ok: bool,
            error: &'static str,
        }

        let (status, error) = match self.0 {
            RelayError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            RelayError::NotFound => (StatusCode::NOT_FOUND, "client session not found"),
            RelayError::Internal(detail) => {
                tracing::error!(error = %detail, "voice request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        };

        (status, Json(ErrorResponse { ok: false, error })).into_response()
    }
}

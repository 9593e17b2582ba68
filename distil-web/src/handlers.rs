//! HTTP handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use distil::extract::Extractor;
use distil::{Error, ExtractError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::AppState;
use crate::page::INDEX_HTML;

/// Extraction request body.
#[derive(Debug, Deserialize)]
pub struct ExtractIn {
    /// Free-form source text.
    pub text: String,
    /// JSON Schema, as JSON text.
    pub schema: String,
    /// Optional override of the default extraction instruction.
    #[serde(default)]
    pub instruction: Option<String>,
}

/// Extraction response body.
#[derive(Debug, Serialize)]
pub struct ExtractOut {
    /// The extracted JSON value.
    pub data: Value,
}

/// Error envelope returned to the client.
#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Human-readable description of the failure.
    pub error: String,
    #[serde(skip)]
    status: StatusCode,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            // The caller sent a schema that is not JSON.
            Error::Extract(ExtractError::InvalidSchema(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            // The model replied, but nothing useful came back.
            Error::Extract(_) => StatusCode::BAD_GATEWAY,
            Error::Llm(_) | Error::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(%err, "extraction failed");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

/// Serve the single-page UI.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Run one extraction: text + schema in, conforming JSON out.
pub async fn extract(
    State(state): State<AppState>,
    Json(input): Json<ExtractIn>,
) -> Result<Json<ExtractOut>, ApiError> {
    if input.text.trim().is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "text must not be empty"));
    }
    debug!(text_len = input.text.len(), "extraction request");
    let data = match input.instruction.as_deref() {
        // Per-request instruction: build a one-off extractor over the
        // shared provider.
        Some(instruction) if !instruction.trim().is_empty() => {
            Extractor::new(Arc::clone(&state.provider))
                .instruction(instruction)
                .extract_text(&input.text, &input.schema)
                .await?
        }
        _ => {
            state
                .extractor
                .extract_text(&input.text, &input.schema)
                .await?
        }
    };
    Ok(Json(ExtractOut { data }))
}

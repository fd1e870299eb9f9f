use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A provider API key is absent. Reported per request, never retried.
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    /// Upstream provider failure. `details` carries the provider's own error text.
    #[error("LLM error: {message}: {details}")]
    Llm { message: String, details: String },

    /// The provider answered, but not with the JSON we asked for.
    #[error("Parse failure: {message}")]
    ParseFailure { message: String, raw: String },

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wraps a provider error, keeping a parse failure distinct from a request failure.
    pub fn from_llm(message: &str, err: LlmError) -> Self {
        match err {
            LlmError::MalformedJson { source, raw } => AppError::ParseFailure {
                message: format!("{message}: {source}"),
                raw,
            },
            other => AppError::Llm {
                message: message.to_string(),
                details: other.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None),
            AppError::MissingConfig(msg) => {
                tracing::error!("Missing configuration: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CONFIG_MISSING",
                    msg.clone(),
                    None,
                )
            }
            AppError::Llm { message, details } => {
                tracing::error!("LLM error: {message}: {details}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    message.clone(),
                    Some(details.clone()),
                )
            }
            AppError::ParseFailure { message, raw } => {
                tracing::error!("Failed to parse LLM output: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PARSE_ERROR",
                    message.clone(),
                    Some(raw.clone()),
                )
            }
            AppError::Catalog(e) => {
                tracing::error!("Catalog error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "CATALOG_ERROR",
                    "Failed to load jobs".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = json!(details);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

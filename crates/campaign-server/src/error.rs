use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use campaign_core::error::MetricsError;

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant renders as `{ "error": "<message>" }`, the body shape the
/// dashboard reads. Handlers return `Result<impl IntoResponse, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required identifying parameter was absent.
    #[error("{0}")]
    MissingParameter(String),

    #[error("{0}")]
    BadRequest(String),

    /// A pass-through CRUD call failed in the gateway. The CRUD contract
    /// reports these as 400 with the gateway's message.
    #[error("{0}")]
    Gateway(String),

    /// The metrics read failed on every source the policy allowed.
    #[error("{0}")]
    MetricsUnavailable(String),
}

impl From<MetricsError> for AppError {
    fn from(e: MetricsError) -> Self {
        match e {
            MetricsError::MissingParameter(msg) => AppError::MissingParameter(msg.to_string()),
            MetricsError::Gateway(e) => AppError::MetricsUnavailable(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::MissingParameter(msg) | AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Gateway(msg) => {
                tracing::warn!(error = %msg, "Gateway request failed");
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::MetricsUnavailable(msg) => {
                tracing::error!(error = %msg, "Metrics unavailable");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

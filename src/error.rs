//! Application error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Errors surfaced by handlers and engine clients
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input (400)
    #[error("{0}")]
    InvalidRequest(String),

    /// An external engine could not be constructed or authenticated (503)
    #[error("{message}")]
    EngineUnavailable { message: String, details: String },

    /// An external engine answered with an error (502)
    #[error("{0}")]
    EngineError(String),

    /// The object detector failed (500)
    #[error("Detection failed: {0}")]
    Detector(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// JSON error body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::EngineUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::EngineError(_) => StatusCode::BAD_GATEWAY,
            AppError::Detector(_)
            | AppError::Config(_)
            | AppError::HttpClient(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Request failed");
        }

        let body = match self {
            AppError::EngineUnavailable { message, details } => ErrorResponse {
                error: message,
                details: Some(details),
            },
            other => ErrorResponse {
                error: other.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

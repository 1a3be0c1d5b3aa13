// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.
//!
//! Every handler returns `Result<_, AppError>`; nothing propagates as an
//! unhandled fault. Upstream (Graph) failures mirror the upstream status and
//! payload, everything else maps to a fixed status with a descriptive body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("No access token")]
    NoAccessToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Error reported by the Graph API; the response mirrors the upstream
    /// status code and carries the upstream payload verbatim.
    #[error("Upstream error (HTTP {status})")]
    Upstream { status: u16, body: Value },

    #[error("Token store error: {0}")]
    Store(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wrap a transport-level upstream failure (no HTTP status available).
    pub fn upstream_transport(err: reqwest::Error) -> Self {
        AppError::Upstream {
            status: 500,
            body: json!(format!("Upstream request failed: {}", err)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!(msg)),
            AppError::NoAccessToken => (StatusCode::FORBIDDEN, json!("No access token.")),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!(msg)),
            AppError::Upstream { status, body } => (
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                body,
            ),
            AppError::Store(msg) => {
                tracing::error!(error = %msg, "Token store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!("Internal server error."),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!("Internal server error."),
                )
            }
        };

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_mirrors_status() {
        let err = AppError::Upstream {
            status: 429,
            body: json!({"code": "tooManyRequests"}),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_bogus_upstream_status_falls_back_to_500() {
        let err = AppError::Upstream {
            status: 42,
            body: json!("?"),
        };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Caller-facing errors, mapped to HTTP status codes at the boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests: {0}")]
    RateLimited(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures from the generative backend. These never reach the caller:
/// the conversation engine replaces them with fixed fallback replies.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend request failed: {0}")]
    Failed(String),

    #[error("Backend returned no usable text")]
    Empty,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::NotFound(msg) => {
                tracing::warn!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, "NotFound", msg)
            }
            ApiError::RateLimited(msg) => {
                tracing::warn!("Rate limited: {}", msg);
                (StatusCode::TOO_MANY_REQUESTS, "TooManyRequests", msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError", msg)
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

//! Error types for the HTTP layer
//!
//! Clients only ever see a short message and a code; the underlying cause
//! is logged.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;
use crate::upstream::UPSTREAM_FAILURE_MESSAGE;

pub const STORE_UNAVAILABLE_MESSAGE: &str =
    "Your favorites are temporarily unavailable. Please try again.";

/// Seconds a client should wait before retrying after a store outage
pub const STORE_RETRY_AFTER_SECS: u64 = 5;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Session store transport failure (503, retryable)
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => ApiError::StoreUnavailable(msg),
            StoreError::Corrupt(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::StoreUnavailable(cause) => {
                tracing::error!(cause = %cause, "StoreUnavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORE_UNAVAILABLE",
                    STORE_UNAVAILABLE_MESSAGE.to_string(),
                )
            }
            ApiError::Internal(cause) => {
                tracing::error!(cause = %cause, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    UPSTREAM_FAILURE_MESSAGE.to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        let mut response = (status, body).into_response();
        if matches!(self, ApiError::StoreUnavailable(_)) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, STORE_RETRY_AFTER_SECS.into());
        }
        response
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

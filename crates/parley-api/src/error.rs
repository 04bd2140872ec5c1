//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping internal errors to appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use parley_completion::CompletionError;
use parley_core::error::ParleyError;

/// JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// HTTP status code, mirrored in the body like success responses.
    pub code: u16,
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - a required field is missing.
    BadRequest(String),
    /// 404 Not Found - referenced category does not exist.
    NotFound(String),
    /// 500 - the completion endpoint failed; the description is returned.
    Upstream(String),
    /// 500 - unexpected server error; details are logged, not returned.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Upstream(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "upstream_error", msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            code: status.as_u16(),
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ParleyError> for ApiError {
    fn from(err: ParleyError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<CompletionError> for ApiError {
    fn from(err: CompletionError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn parts(err: ApiError) -> (StatusCode, ErrorBody) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_bad_request_maps_to_400() {
        let (status, body) = parts(ApiError::BadRequest("'ask' is required".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, 400);
        assert_eq!(body.error, "bad_request");
        assert_eq!(body.message, "'ask' is required");
    }

    #[tokio::test]
    async fn test_not_found_maps_to_404() {
        let (status, body) = parts(ApiError::NotFound("no such category".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.code, 404);
    }

    #[tokio::test]
    async fn test_upstream_keeps_description() {
        let err: ApiError = CompletionError::Timeout(30).into();
        let (status, body) = parts(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "upstream_error");
        assert_eq!(body.message, "request timed out after 30s");
    }

    #[tokio::test]
    async fn test_storage_error_is_sanitized() {
        let err: ApiError = ParleyError::Storage("disk I/O error at /var/db".into()).into();
        let (status, body) = parts(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "internal_error");
        assert!(!body.message.contains("/var/db"));
    }
}

//! Error types for the completion client.

/// Failures talking to the completion endpoint.
///
/// None of these are retried; callers surface them as server errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("completion endpoint is not configured")]
    NotConfigured,
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("request timed out after {0}s")]
    Timeout(u64),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
}

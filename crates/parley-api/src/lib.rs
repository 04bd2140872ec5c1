//! Parley API crate - axum HTTP server, route handlers, SSE streaming.
//!
//! Provides the REST API: single-shot chat streamed as server-sent events,
//! conversation categories, and paginated question history.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stream;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;

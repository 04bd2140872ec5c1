//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, a body size limit and all
//! endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use parley_core::error::ParleyError;

use crate::handlers;
use crate::state::AppState;

/// Build the CORS layer from the configured origins. An empty list allows
/// any origin; entries that are not valid header values are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
}

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/chat/", post(handlers::chat))
        .route(
            "/cates/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/questions/",
            get(handlers::list_questions).post(handlers::ask_question),
        )
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the configured host and port.
pub async fn start_server(state: AppState) -> Result<(), ParleyError> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| ParleyError::Api(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| ParleyError::Api(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_skips_invalid_origins() {
        // Construction must not panic on a bad entry.
        let _ = cors_layer(&["http://localhost:5173".to_string(), "bad\norigin".to_string()]);
        let _ = cors_layer(&[]);
    }
}

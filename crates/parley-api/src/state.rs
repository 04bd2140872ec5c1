//! Application state shared across all route handlers.
//!
//! AppState holds the repositories over the shared database and the
//! completion client. It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parley_completion::CompletionClient;
use parley_core::config::ParleyConfig;
use parley_storage::{CategoryRepository, Database, QuestionRepository};

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration, fixed at startup.
    pub config: Arc<ParleyConfig>,
    pub categories: Arc<CategoryRepository>,
    pub questions: Arc<QuestionRepository>,
    /// Client for the remote completion endpoint.
    pub completion: Arc<dyn CompletionClient>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState with the given components.
    pub fn new(
        config: ParleyConfig,
        database: Database,
        completion: Arc<dyn CompletionClient>,
    ) -> Self {
        let database = Arc::new(database);
        Self {
            config: Arc::new(config),
            categories: Arc::new(CategoryRepository::new(Arc::clone(&database))),
            questions: Arc::new(QuestionRepository::new(database)),
            completion,
            start_time: Instant::now(),
        }
    }

    /// Pause between characters of a streamed chat answer.
    pub fn stream_delay(&self) -> Duration {
        Duration::from_millis(self.config.chat.stream_delay_ms)
    }
}

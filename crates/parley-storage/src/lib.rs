//! Parley storage crate - SQLite persistence for categories and questions.
//!
//! Provides a WAL-mode SQLite database with versioned migrations and the
//! repositories the HTTP layer composes.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{CategoryRepository, QuestionRepository};

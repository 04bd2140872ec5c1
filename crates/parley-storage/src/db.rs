//! Database connection management.
//!
//! Wraps a single rusqlite Connection in a Mutex for thread-safe access.
//! Configures WAL mode and recommended PRAGMAs on initialization.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use parley_core::error::ParleyError;

use crate::migrations;

/// Thread-safe SQLite database wrapper.
///
/// The connection is wrapped in a Mutex since rusqlite Connection is not
/// Sync. Foreign keys are enabled so deleting a category cascades to its
/// questions.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database at the given path.
    ///
    /// Configures WAL mode, synchronous=NORMAL, foreign keys, and runs
    /// all pending migrations.
    pub fn new(path: &Path) -> Result<Self, ParleyError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| ParleyError::Storage(format!("Failed to open database: {}", e)))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| ParleyError::Storage(format!("Failed to set pragmas: {}", e)))?;

        info!("Database opened at {}", path.display());

        Self::migrated(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> Result<Self, ParleyError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ParleyError::Storage(format!("Failed to open in-memory db: {}", e)))?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| ParleyError::Storage(format!("Failed to set pragmas: {}", e)))?;

        Self::migrated(conn)
    }

    fn migrated(conn: Connection) -> Result<Self, ParleyError> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Execute a closure with a reference to the underlying connection.
    ///
    /// The mutex is held for the duration of the closure, so multi-statement
    /// operations inside one closure are not interleaved with other callers.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, ParleyError>
    where
        F: FnOnce(&Connection) -> Result<T, ParleyError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ParleyError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_categories(db: &Database) -> i64 {
        db.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
                .map_err(|e| ParleyError::Storage(e.to_string()))
        })
        .unwrap()
    }

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        assert_eq!(count_categories(&db), 0);
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("parley.db");
        let db = Database::new(&path).unwrap();

        assert_eq!(count_categories(&db), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::in_memory().unwrap();
        let enabled: i64 = db
            .with_conn(|conn| {
                conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                    .map_err(|e| ParleyError::Storage(e.to_string()))
            })
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.db");

        {
            let db = Database::new(&path).unwrap();
            db.with_conn(|conn| {
                conn.execute(
                    "INSERT INTO categories (code, created_at) VALUES ('c123456', 0)",
                    [],
                )
                .map_err(|e| ParleyError::Storage(e.to_string()))?;
                Ok(())
            })
            .unwrap();
        }

        let db = Database::new(&path).unwrap();
        assert_eq!(count_categories(&db), 1);
    }
}

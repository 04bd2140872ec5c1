//! Database schema migrations.
//!
//! Applies the initial schema: the categories and questions tables plus the
//! schema_migrations bookkeeping table.

use rusqlite::Connection;
use tracing::info;

use parley_core::error::ParleyError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), ParleyError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| ParleyError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| ParleyError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
///
/// Timestamps are epoch milliseconds.
fn apply_v1(conn: &Connection) -> Result<(), ParleyError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS categories (
            code        TEXT PRIMARY KEY NOT NULL,
            title       TEXT,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_categories_created_at
            ON categories (created_at DESC);

        CREATE TABLE IF NOT EXISTS questions (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            ask             TEXT,
            answer          TEXT NOT NULL DEFAULT '',
            answered_at     INTEGER NOT NULL,
            category_code   TEXT NOT NULL,
            FOREIGN KEY (category_code) REFERENCES categories(code) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_questions_category
            ON questions (category_code, answered_at DESC);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| ParleyError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(conn: &Connection) -> i64 {
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn test_migrations_apply_once() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(version(&conn), 1);

        // Second run is a no-op.
        run_migrations(&conn).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_tables_exist() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        for table in ["categories", "questions"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }
}

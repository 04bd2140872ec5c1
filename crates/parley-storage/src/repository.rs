//! Repository implementations for SQLite-backed persistence.
//!
//! Provides CategoryRepository and QuestionRepository that operate on the
//! Database struct using raw SQL.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use parley_core::error::ParleyError;
use parley_core::types::{self, Category, Question, QuestionPage, PAGE_SIZE};

use crate::db::Database;

/// Leading character of every category code.
pub const CODE_PREFIX: char = 'c';

/// How many fresh codes to try before giving up on a category insert.
const MAX_CODE_ATTEMPTS: usize = 32;

type CodeGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Draw a category code: the prefix followed by a random 6-digit number.
pub fn generate_code() -> String {
    let n: u32 = rand::rng().random_range(100_000..1_000_000);
    format!("{}{}", CODE_PREFIX, n)
}

/// Repository for conversation categories.
pub struct CategoryRepository {
    db: Arc<Database>,
    next_code: CodeGenerator,
}

impl CategoryRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            next_code: Arc::new(generate_code),
        }
    }

    /// Use a custom code source instead of the random generator.
    pub fn with_code_generator<F>(db: Arc<Database>, next_code: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            db,
            next_code: Arc::new(next_code),
        }
    }

    /// Return the oldest category that has no title yet, creating one only
    /// when none exists.
    ///
    /// Lookup and insert run under a single connection lock.
    pub fn ensure_open(&self) -> Result<Category, ParleyError> {
        self.db.with_conn(|conn| self.ensure_open_in(conn))
    }

    /// Resolve `code` to its category. A missing or unknown code falls back
    /// to [`ensure_open`](Self::ensure_open) instead of failing.
    pub fn get_or_create_by_code(&self, code: Option<&str>) -> Result<Category, ParleyError> {
        self.db.with_conn(|conn| {
            if let Some(code) = code {
                if let Some(category) = find_by_code_in(conn, code)? {
                    return Ok(category);
                }
                debug!(code = %code, "Unknown category code, falling back to an open category");
            }
            self.ensure_open_in(conn)
        })
    }

    /// Find a category by its code.
    pub fn find_by_code(&self, code: &str) -> Result<Option<Category>, ParleyError> {
        self.db.with_conn(|conn| find_by_code_in(conn, code))
    }

    /// Name an untitled category after the first characters of `text`.
    ///
    /// Returns the new title, or `None` when the category already had one
    /// (or does not exist).
    pub fn rename_if_unnamed(&self, code: &str, text: &str) -> Result<Option<String>, ParleyError> {
        self.db.with_conn(|conn| rename_in(conn, code, text))
    }

    /// List titled categories, newest first, optionally restricted to
    /// titles starting with `title_prefix` (case-sensitive).
    pub fn list(&self, title_prefix: Option<&str>) -> Result<Vec<Category>, ParleyError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT code, title, created_at
                     FROM categories
                     WHERE title IS NOT NULL
                       AND (?1 IS NULL OR substr(title, 1, length(?1)) = ?1)
                     ORDER BY created_at DESC, rowid DESC",
                )
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![title_prefix], row_to_category)
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| ParleyError::Storage(e.to_string()))
        })
    }

    /// Count all categories, titled or not.
    pub fn count(&self) -> Result<u64, ParleyError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
                .map_err(|e| ParleyError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }

    fn ensure_open_in(&self, conn: &Connection) -> Result<Category, ParleyError> {
        let open = conn
            .query_row(
                "SELECT code, title, created_at
                 FROM categories
                 WHERE title IS NULL
                 ORDER BY created_at ASC, rowid ASC
                 LIMIT 1",
                [],
                row_to_category,
            )
            .optional()
            .map_err(|e| ParleyError::Storage(e.to_string()))?;

        match open {
            Some(category) => Ok(category),
            None => self.insert_fresh(conn),
        }
    }

    /// Insert a new untitled category. The primary key rejects a duplicate
    /// code, in which case another code is drawn.
    fn insert_fresh(&self, conn: &Connection) -> Result<Category, ParleyError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = (self.next_code)();
            let created_at = Utc::now();

            let result = conn.execute(
                "INSERT INTO categories (code, title, created_at) VALUES (?1, NULL, ?2)",
                rusqlite::params![code, created_at.timestamp_millis()],
            );

            match result {
                Ok(_) => {
                    info!(code = %code, "Category created");
                    return Ok(Category {
                        code,
                        title: None,
                        created_at: from_millis(created_at.timestamp_millis()),
                    });
                }
                Err(e) if is_constraint_violation(&e) => {
                    debug!(code = %code, "Category code already taken, drawing another");
                }
                Err(e) => {
                    return Err(ParleyError::Storage(format!(
                        "Failed to create category: {}",
                        e
                    )));
                }
            }
        }

        Err(ParleyError::Storage(format!(
            "No free category code after {} attempts",
            MAX_CODE_ATTEMPTS
        )))
    }
}

/// Repository for question/answer records.
pub struct QuestionRepository {
    db: Arc<Database>,
}

impl QuestionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store an answered question. The answer time is assigned here.
    pub fn create(
        &self,
        ask: Option<&str>,
        answer: &str,
        category_code: &str,
    ) -> Result<Question, ParleyError> {
        self.db
            .with_conn(|conn| insert_question_in(conn, ask, answer, category_code))
    }

    /// Store an answered question and, if its category is still untitled,
    /// name the category after it. Both writes commit together or not at all.
    ///
    /// Returns the stored question and the new title, if one was set.
    pub fn record(
        &self,
        ask: &str,
        answer: &str,
        category_code: &str,
    ) -> Result<(Question, Option<String>), ParleyError> {
        self.db.with_conn(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let title = rename_in(&tx, category_code, ask)?;
            let question = insert_question_in(&tx, Some(ask), answer, category_code)?;

            tx.commit()
                .map_err(|e| ParleyError::Storage(format!("Failed to commit question: {}", e)))?;
            Ok((question, title))
        })
    }

    /// Count the questions stored under a category.
    pub fn count_for_category(&self, category_code: &str) -> Result<u64, ParleyError> {
        self.db.with_conn(|conn| count_in(conn, category_code))
    }

    /// Fetch one page of a category's history, newest first.
    ///
    /// A missing, zero or out-of-range `requested` page yields page 1.
    pub fn list_page(
        &self,
        category_code: &str,
        requested: Option<u64>,
    ) -> Result<QuestionPage, ParleyError> {
        self.db.with_conn(|conn| {
            let total_pages = types::total_pages(count_in(conn, category_code)?);
            let page = types::resolve_page(requested, total_pages);
            let offset = (page - 1) * PAGE_SIZE;

            let mut stmt = conn
                .prepare(
                    "SELECT id, ask, answer, answered_at, category_code
                     FROM questions
                     WHERE category_code = ?1
                     ORDER BY answered_at DESC, id DESC
                     LIMIT ?2 OFFSET ?3",
                )
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![category_code, PAGE_SIZE as i64, offset as i64],
                    row_to_question,
                )
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            let items = rows
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ParleyError::Storage(e.to_string()))?;

            Ok(QuestionPage {
                items,
                page,
                total_pages,
            })
        })
    }
}

// =============================================================================
// Row mapping helpers
// =============================================================================

fn rename_in(conn: &Connection, code: &str, text: &str) -> Result<Option<String>, ParleyError> {
    let title = types::title_from(text);
    let changed = conn
        .execute(
            "UPDATE categories SET title = ?1 WHERE code = ?2 AND title IS NULL",
            rusqlite::params![title, code],
        )
        .map_err(|e| ParleyError::Storage(format!("Failed to rename category: {}", e)))?;

    if changed == 0 {
        return Ok(None);
    }
    info!(code = %code, title = %title, "Category named");
    Ok(Some(title))
}

fn insert_question_in(
    conn: &Connection,
    ask: Option<&str>,
    answer: &str,
    category_code: &str,
) -> Result<Question, ParleyError> {
    let answered_at = from_millis(Utc::now().timestamp_millis());
    conn.execute(
        "INSERT INTO questions (ask, answer, answered_at, category_code)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![ask, answer, answered_at.timestamp_millis(), category_code],
    )
    .map_err(|e| ParleyError::Storage(format!("Failed to save question: {}", e)))?;

    Ok(Question {
        id: conn.last_insert_rowid(),
        ask: ask.map(str::to_string),
        answer: answer.to_string(),
        answered_at,
        category_code: category_code.to_string(),
    })
}

fn find_by_code_in(conn: &Connection, code: &str) -> Result<Option<Category>, ParleyError> {
    conn.query_row(
        "SELECT code, title, created_at FROM categories WHERE code = ?1",
        rusqlite::params![code],
        row_to_category,
    )
    .optional()
    .map_err(|e| ParleyError::Storage(e.to_string()))
}

fn count_in(conn: &Connection, category_code: &str) -> Result<u64, ParleyError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM questions WHERE category_code = ?1",
            rusqlite::params![category_code],
            |row| row.get(0),
        )
        .map_err(|e| ParleyError::Storage(e.to_string()))?;
    Ok(count as u64)
}

fn row_to_category(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    Ok(Category {
        code: row.get(0)?,
        title: row.get(1)?,
        created_at: from_millis(row.get(2)?),
    })
}

fn row_to_question(row: &rusqlite::Row) -> rusqlite::Result<Question> {
    Ok(Question {
        id: row.get(0)?,
        ask: row.get(1)?,
        answer: row.get(2)?,
        answered_at: from_millis(row.get(3)?),
        category_code: row.get(4)?,
    })
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

//! # questline-db
//!
//! Persistence layer for the Questline server.
//! Manages the single SQLite database at `$QUESTLINE_DATA_DIR/questline.db`.
//!
//! ## Schema
//!
//! - WAL mode mandatory
//! - Foreign keys enforced (catalog and per-user rows cascade downward)
//! - All timestamps are Unix epoch seconds (u64)
//! - Free-form JSON payloads are stored as TEXT
//! - Schema version stored in `PRAGMA user_version`

pub mod migrations;
pub mod queries;
pub mod schema;
pub mod seed;

use rusqlite::Connection;
use std::path::Path;
use std::str::FromStr;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the Questline database at the given path.
///
/// Configures WAL mode, foreign keys, and runs any pending migrations.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )?;
    Ok(())
}

/// Map `QueryReturnedNoRows` to [`DbError::NotFound`].
pub(crate) fn not_found(what: &'static str) -> impl Fn(rusqlite::Error) -> DbError {
    move |e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(what.into()),
        other => DbError::Sqlite(other),
    }
}

/// Map UNIQUE / FOREIGN KEY / CHECK failures to [`DbError::Constraint`].
pub(crate) fn constraint(what: &'static str) -> impl Fn(rusqlite::Error) -> DbError {
    move |e| match e {
        rusqlite::Error::SqliteFailure(ref failure, _)
            if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(what.into())
        }
        other => DbError::Sqlite(other),
    }
}

/// Parse a TEXT column into a domain enum.
pub(crate) fn parse_column<T>(idx: usize, raw: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse a JSON TEXT column.
pub(crate) fn json_column(idx: usize, raw: &str) -> rusqlite::Result<serde_json::Value> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Encode a JSON payload for storage.
pub(crate) fn json_text(value: &serde_json::Value) -> Result<String> {
    serde_json::to_string(value).map_err(|e| DbError::Serialization(e.to_string()))
}

/// Read an optional timestamp column.
pub(crate) fn opt_ts(value: Option<i64>) -> Option<u64> {
    value.map(|v| v as u64)
}

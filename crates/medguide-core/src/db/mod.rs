//! Database layer for medguide.

mod schema;
mod medicines;
mod profiles;
mod dispenses;

pub use schema::*;
#[allow(unused_imports)]
pub use medicines::*;
#[allow(unused_imports)]
pub use profiles::*;
#[allow(unused_imports)]
pub use dispenses::*;

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use thiserror::Error;

use crate::config::CoreConfig;

/// Default time a connection waits on a locked database before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// The database was busy or locked; the write did not happen and may be retried.
    #[error("Write conflict: {0}")]
    Conflict(String),
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                DbError::Conflict(e.to_string())
            }
            Some(ErrorCode::ConstraintViolation) => DbError::Constraint(e.to_string()),
            _ => DbError::Sqlite(e),
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
///
/// One `Database` is one SQLite connection. Workers that run concurrently
/// each open their own handle on the same file.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        Self::open_with_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Open the database described by a [`CoreConfig`].
    pub fn open_with_config(config: &CoreConfig) -> DbResult<Self> {
        Self::open_with_timeout(&config.database_path, config.busy_timeout())
    }

    fn open_with_timeout<P: AsRef<Path>>(path: P, busy_timeout: Duration) -> DbResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        conn.busy_timeout(busy_timeout)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.as_ref().display(), journal_mode = %mode, "opened database");
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a write transaction that takes the write lock up front.
    ///
    /// Every `Database` method called on this handle while the returned
    /// transaction is alive runs inside it. Dropping the transaction without
    /// calling `commit` rolls it back.
    pub fn begin_immediate(&self) -> DbResult<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

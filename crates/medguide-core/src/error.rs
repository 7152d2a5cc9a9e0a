//! Domain error model for catalogue, ledger and profile operations.

use thiserror::Error;

use crate::db::DbError;

/// Errors returned by the inventory services.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// Bad input; nothing was changed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Unknown article, QR payload, medicine, profile or event; nothing was changed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store could not apply the write atomically right now; retry.
    #[error("Conflicting write: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl InventoryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<DbError> for InventoryError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => InventoryError::NotFound(what),
            DbError::Conflict(msg) => InventoryError::Conflict(msg),
            other => InventoryError::Database(other),
        }
    }
}

impl From<rusqlite::Error> for InventoryError {
    fn from(e: rusqlite::Error) -> Self {
        DbError::from(e).into()
    }
}

pub type InventoryResult<T> = Result<T, InventoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_map_through() {
        let not_found: InventoryError = DbError::NotFound("MG-00001".into()).into();
        assert!(matches!(not_found, InventoryError::NotFound(_)));

        let conflict: InventoryError = DbError::Conflict("database is locked".into()).into();
        assert!(conflict.is_retryable());

        let other: InventoryError = DbError::Constraint("CHECK".into()).into();
        assert!(matches!(other, InventoryError::Database(_)));
        assert!(!other.is_retryable());
    }
}

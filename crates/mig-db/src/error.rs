//! Error types for mig-db

use mig_core::CoreError;
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table or view not found: {0}")]
    TableNotFound(String),

    /// BEGIN/COMMIT failure (D004)
    #[error("[D004] Transaction failed: {0}")]
    TransactionError(String),

    /// Mutex poisoned (D005)
    #[error("[D005] Database mutex poisoned: {0}")]
    MutexPoisoned(String),

    /// State table holds rows that are not valid revisions (D006)
    #[error("[D006] Corrupt revision state: {0}")]
    CorruptState(String),

    /// Error from the core library (D007)
    #[error("[D007] {0}")]
    Core(#[from] CoreError),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        // duckdb::Error does not expose structured variants for catalog
        // errors, so classify by message.
        let msg = err.to_string();
        if msg.contains("Table with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        let msg = err.to_string();
        if msg.starts_with("no such table") {
            DbError::TableNotFound(msg)
        } else {
            DbError::ExecutionError(msg)
        }
    }
}

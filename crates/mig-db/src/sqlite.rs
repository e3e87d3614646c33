//! SQLite database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use mig_core::DbType;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite database backend
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Create a new in-memory SQLite connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open or create a SQLite database file
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }
}

#[async_trait]
impl Database for SqliteBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{e}: {sql}")))
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<Option<String>>>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let width = stmt.column_count();
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(row.get::<_, Option<String>>(i)?);
            }
            out.push(values);
        }
        Ok(out)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn transaction(&self, statements: &[String]) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

        for sql in statements {
            log::debug!("{sql}");
            if let Err(e) = conn.execute_batch(sql) {
                let _ = conn.execute_batch("ROLLBACK");
                return Err(DbError::ExecutionError(format!("{e}: {sql}")));
            }
        }

        if let Err(e) = conn.execute_batch("COMMIT") {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(DbError::TransactionError(format!("COMMIT failed: {e}")));
        }
        Ok(())
    }

    fn db_type(&self) -> DbType {
        DbType::Sqlite
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;

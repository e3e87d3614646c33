//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use async_trait::async_trait;
use duckdb::Connection;
use mig_core::sql_utils::escape_sql_string;
use mig_core::DbType;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
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

    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::ExecutionError(format!("{e}: {sql}")))
    }

    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    fn query_rows_sync(&self, sql: &str) -> DbResult<Vec<Vec<Option<String>>>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let width = row.as_ref().column_count();
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(row.get::<_, Option<String>>(i)?);
            }
            out.push(values);
        }
        Ok(out)
    }

    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let conn = self.lock()?;

        let (schema, table) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => ("main", name),
        };

        let sql = format!(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = '{}' AND table_name = '{}'",
            escape_sql_string(schema),
            escape_sql_string(table)
        );

        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn transaction_sync(&self, statements: &[String]) -> DbResult<()> {
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
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<Option<String>>>> {
        self.query_rows_sync(sql)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    async fn transaction(&self, statements: &[String]) -> DbResult<()> {
        self.transaction_sync(statements)
    }

    fn db_type(&self) -> DbType {
        DbType::DuckDb
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;

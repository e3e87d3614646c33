//! Database trait definition

use crate::error::DbResult;
use async_trait::async_trait;
use mig_core::{DbType, Dialect};

/// Database abstraction trait for migrations
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Execute one SQL statement, returns affected rows
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Execute multiple SQL statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Run a query and return every row as text.
    ///
    /// Columns must be text or NULL; cast other types in the query.
    async fn query_rows(&self, sql: &str) -> DbResult<Vec<Vec<Option<String>>>>;

    /// Check if a table or view exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Run `statements` between `BEGIN` and `COMMIT`, rolling back on the
    /// first failure and returning it.
    async fn transaction(&self, statements: &[String]) -> DbResult<()>;

    /// Backend type
    fn db_type(&self) -> DbType;

    /// SQL dialect the backend speaks
    fn dialect(&self) -> Dialect {
        self.db_type().dialect()
    }
}

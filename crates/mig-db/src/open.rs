//! Backend selection from configuration

use crate::duckdb::DuckDbBackend;
use crate::error::DbResult;
use crate::sqlite::SqliteBackend;
use crate::traits::Database;
use mig_core::{DatabaseConfig, DbType};
use std::path::Path;

/// Open the configured backend. Relative paths resolve against `root`.
pub fn open_database(config: &DatabaseConfig, root: &Path) -> DbResult<Box<dyn Database>> {
    let path = if config.path == ":memory:" || Path::new(&config.path).is_absolute() {
        config.path.clone()
    } else {
        root.join(&config.path).display().to_string()
    };
    log::debug!("Opening {} database at {}", config.db_type, path);

    Ok(match config.db_type {
        DbType::DuckDb => Box::new(DuckDbBackend::new(&path)?),
        DbType::Sqlite => Box::new(SqliteBackend::new(&path)?),
    })
}

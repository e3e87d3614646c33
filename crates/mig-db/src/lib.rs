//! mig-db - Database layer for migrations
//!
//! This crate provides the `Database` trait with DuckDB and SQLite
//! backends, the applied-revision state store, and the runner that walks
//! upgrade and downgrade paths.

pub mod duckdb;
pub mod error;
pub mod open;
pub mod runner;
pub mod sqlite;
pub mod state;
pub mod traits;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use open::open_database;
pub use runner::{
    Direction, RunReport, Runner, RunnerError, RunnerOptions, RunnerResult, StatusReport,
};
pub use sqlite::SqliteBackend;
pub use state::{AppliedRevision, StateStore};
pub use traits::Database;

//! mig-core - Core library for migrations
//!
//! This crate provides the schema model, node file format, configuration
//! parsing, project loading, the revision graph, schema diffing, per-dialect
//! feasibility checks and SQL emission used by the runner and the CLI.

pub mod check;
pub mod checksum;
pub mod config;
pub mod diff;
pub mod error;
pub mod feasibility;
pub mod generate;
pub mod graph;
pub mod models;
pub mod node;
pub mod operation;
pub mod project;
pub mod revision;
pub mod schema;
pub(crate) mod serde_helpers;
pub mod sql;
pub mod sql_utils;

#[cfg(test)]
pub(crate) mod test_utils;

pub use check::{check_project, CheckReport};
pub use checksum::compute_checksum;
pub use config::{Config, DatabaseConfig, DbType, Dialect, TransactionMode};
pub use diff::diff_schemas;
pub use error::{CoreError, CoreResult};
pub use feasibility::{ensure_feasible, Infeasibility};
pub use generate::{generate, merge, new_revision, GenerateOutcome};
pub use graph::{RevisionGraph, Target};
pub use node::MigrationNode;
pub use operation::SchemaOperation;
pub use project::Project;
pub use revision::RevisionId;
pub use schema::{ColumnDef, ColumnType, SchemaSnapshot, TableDef};

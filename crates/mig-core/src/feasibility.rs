//! Per-dialect feasibility checks for schema operations.
//!
//! Generation refuses to write a node whose operations the configured
//! backend cannot run; the runner repeats the check before it executes
//! anything.

use crate::config::Dialect;
use crate::error::{CoreError, CoreResult};
use crate::operation::SchemaOperation;
use std::fmt;

/// One operation the dialect cannot run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Infeasibility {
    /// Which list the operation came from (`up` or `down`)
    pub phase: &'static str,
    /// Operation description
    pub operation: String,
    /// Why the dialect rejects it
    pub reason: String,
}

impl fmt::Display for Infeasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.phase, self.operation, self.reason)
    }
}

/// Why `op` cannot run on `dialect`, or `None` if it can.
pub fn unsupported_reason(op: &SchemaOperation, dialect: Dialect) -> Option<String> {
    match (dialect, op) {
        (Dialect::Postgres, SchemaOperation::AlterColumn { from, to, .. }) => {
            if from.primary_key != to.primary_key {
                Some("changing primary key membership requires a table rebuild".to_string())
            } else {
                None
            }
        }
        (Dialect::Postgres, _) => None,

        (Dialect::Sqlite, SchemaOperation::AlterColumn { .. }) => {
            Some("SQLite does not support altering columns".to_string())
        }
        (Dialect::Sqlite, SchemaOperation::AddColumn { column, .. }) => {
            if column.primary_key || column.unique {
                Some("SQLite cannot add a PRIMARY KEY or UNIQUE column".to_string())
            } else if !column.nullable && column.default.is_none() {
                Some("SQLite cannot add a NOT NULL column without a default".to_string())
            } else {
                None
            }
        }
        (Dialect::Sqlite, SchemaOperation::DropColumn { column, .. }) => {
            if column.primary_key || column.unique {
                Some("SQLite cannot drop a PRIMARY KEY or UNIQUE column".to_string())
            } else {
                None
            }
        }

        (Dialect::DuckDb, SchemaOperation::AddColumn { column, .. }) => {
            if column.primary_key || column.unique || !column.nullable {
                Some("DuckDB cannot add a column with PRIMARY KEY, UNIQUE or NOT NULL constraints".to_string())
            } else {
                None
            }
        }
        (Dialect::DuckDb, SchemaOperation::AlterColumn { from, to, .. }) => {
            if from.constraints_differ(to) {
                Some("DuckDB cannot change PRIMARY KEY or UNIQUE constraints of a column".to_string())
            } else {
                None
            }
        }
        (Dialect::DuckDb, SchemaOperation::DropColumn { column, .. }) => {
            if column.primary_key || column.unique {
                Some("DuckDB cannot drop a column that an index depends on".to_string())
            } else {
                None
            }
        }

        _ => None,
    }
}

/// Collect every infeasible operation in `ops`.
pub fn check_operations(
    ops: &[SchemaOperation],
    dialect: Dialect,
    phase: &'static str,
) -> Vec<Infeasibility> {
    ops.iter()
        .filter_map(|op| {
            unsupported_reason(op, dialect).map(|reason| Infeasibility {
                phase,
                operation: op.to_string(),
                reason,
            })
        })
        .collect()
}

/// Fail with every problem found in `up` and `down`.
pub fn ensure_feasible(
    up: &[SchemaOperation],
    down: &[SchemaOperation],
    dialect: Dialect,
) -> CoreResult<()> {
    let mut problems = check_operations(up, dialect, "up");
    problems.extend(check_operations(down, dialect, "down"));
    into_result(problems, dialect)
}

/// Turn a list of problems into `InfeasibleOperations`, or `Ok` if empty.
pub fn into_result(problems: Vec<Infeasibility>, dialect: Dialect) -> CoreResult<()> {
    if problems.is_empty() {
        return Ok(());
    }
    Err(CoreError::InfeasibleOperations {
        dialect: dialect.to_string(),
        problems: problems
            .iter()
            .map(|p| format!("  {p}"))
            .collect::<Vec<_>>()
            .join("\n"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, ColumnType};

    fn add(column: ColumnDef) -> SchemaOperation {
        SchemaOperation::AddColumn {
            table: "users".to_string(),
            column,
        }
    }

    fn alter_type() -> SchemaOperation {
        SchemaOperation::AlterColumn {
            table: "users".to_string(),
            from: ColumnDef::new("name", ColumnType::Varchar(Some(64))),
            to: ColumnDef::new("name", ColumnType::Text),
        }
    }

    #[test]
    fn test_sqlite_rejects_alter_column() {
        let reason = unsupported_reason(&alter_type(), Dialect::Sqlite).unwrap();
        assert!(reason.contains("altering columns"));
    }

    #[test]
    fn test_duckdb_and_postgres_allow_type_change() {
        assert!(unsupported_reason(&alter_type(), Dialect::DuckDb).is_none());
        assert!(unsupported_reason(&alter_type(), Dialect::Postgres).is_none());
    }

    #[test]
    fn test_add_not_null_column() {
        let col = ColumnDef::new("age", ColumnType::Integer).not_null();
        assert!(unsupported_reason(&add(col.clone()), Dialect::Sqlite).is_some());
        assert!(unsupported_reason(&add(col.clone()), Dialect::DuckDb).is_some());
        assert!(unsupported_reason(&add(col.clone()), Dialect::Postgres).is_none());

        let with_default = col.with_default("0");
        assert!(unsupported_reason(&add(with_default), Dialect::Sqlite).is_none());
    }

    #[test]
    fn test_add_unique_column() {
        let col = ColumnDef::new("email", ColumnType::Text).unique();
        assert!(unsupported_reason(&add(col.clone()), Dialect::Sqlite).is_some());
        assert!(unsupported_reason(&add(col), Dialect::DuckDb).is_some());
    }

    #[test]
    fn test_ensure_feasible_lists_every_problem() {
        let up = vec![alter_type(), add(ColumnDef::new("id", ColumnType::Integer).primary_key())];
        let down = vec![alter_type()];
        let err = ensure_feasible(&up, &down, Dialect::Sqlite).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("sqlite"));
        assert_eq!(msg.matches("up: ").count(), 2);
        assert_eq!(msg.matches("down: ").count(), 1);
    }

    #[test]
    fn test_create_and_drop_table_always_feasible() {
        let table = crate::schema::TableDef::new(
            "t",
            vec![ColumnDef::new("id", ColumnType::Integer).primary_key()],
        );
        let ops = vec![
            SchemaOperation::CreateTable {
                table: table.clone(),
            },
            SchemaOperation::DropTable { table },
        ];
        for dialect in [Dialect::DuckDb, Dialect::Sqlite, Dialect::Postgres] {
            assert!(ensure_feasible(&ops, &ops, dialect).is_ok());
        }
    }
}

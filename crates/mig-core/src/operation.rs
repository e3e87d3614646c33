//! Schema operations carried by migration nodes.

use crate::error::{CoreError, CoreResult};
use crate::schema::{ColumnDef, SchemaSnapshot, TableDef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single forward or inverse schema change.
///
/// Destructive variants carry the full definition they remove so that every
/// operation except `Execute` has a mechanical inverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum SchemaOperation {
    CreateTable {
        table: TableDef,
    },
    DropTable {
        table: TableDef,
    },
    AddColumn {
        table: String,
        column: ColumnDef,
    },
    DropColumn {
        table: String,
        column: ColumnDef,
    },
    AlterColumn {
        table: String,
        from: ColumnDef,
        to: ColumnDef,
    },
    RenameTable {
        from: String,
        to: String,
    },
    /// Free-form SQL written by hand; opaque to the snapshot.
    Execute {
        sql: String,
    },
}

impl SchemaOperation {
    /// Short kind name as written in node files.
    pub fn kind(&self) -> &'static str {
        match self {
            SchemaOperation::CreateTable { .. } => "create_table",
            SchemaOperation::DropTable { .. } => "drop_table",
            SchemaOperation::AddColumn { .. } => "add_column",
            SchemaOperation::DropColumn { .. } => "drop_column",
            SchemaOperation::AlterColumn { .. } => "alter_column",
            SchemaOperation::RenameTable { .. } => "rename_table",
            SchemaOperation::Execute { .. } => "execute",
        }
    }

    /// The operation that undoes this one, if there is one.
    pub fn inverse(&self) -> Option<SchemaOperation> {
        match self {
            SchemaOperation::CreateTable { table } => Some(SchemaOperation::DropTable {
                table: table.clone(),
            }),
            SchemaOperation::DropTable { table } => Some(SchemaOperation::CreateTable {
                table: table.clone(),
            }),
            SchemaOperation::AddColumn { table, column } => Some(SchemaOperation::DropColumn {
                table: table.clone(),
                column: column.clone(),
            }),
            SchemaOperation::DropColumn { table, column } => Some(SchemaOperation::AddColumn {
                table: table.clone(),
                column: column.clone(),
            }),
            SchemaOperation::AlterColumn { table, from, to } => {
                Some(SchemaOperation::AlterColumn {
                    table: table.clone(),
                    from: to.clone(),
                    to: from.clone(),
                })
            }
            SchemaOperation::RenameTable { from, to } => Some(SchemaOperation::RenameTable {
                from: to.clone(),
                to: from.clone(),
            }),
            SchemaOperation::Execute { .. } => None,
        }
    }

    /// Apply the operation to a snapshot, failing if the snapshot is not in
    /// the state the operation expects.
    pub fn apply_to(&self, snapshot: &mut SchemaSnapshot) -> CoreResult<()> {
        let invalid = |reason: String| CoreError::InvalidOperation {
            operation: self.to_string(),
            reason,
        };

        match self {
            SchemaOperation::CreateTable { table } => {
                table.validate()?;
                if snapshot.tables.contains_key(&table.name) {
                    return Err(invalid(format!("table '{}' already exists", table.name)));
                }
                snapshot.tables.insert(table.name.clone(), table.clone());
            }
            SchemaOperation::DropTable { table } => {
                if snapshot.tables.remove(&table.name).is_none() {
                    return Err(invalid(format!("table '{}' does not exist", table.name)));
                }
            }
            SchemaOperation::AddColumn { table, column } => {
                let def = table_mut(snapshot, table).ok_or_else(|| {
                    invalid(format!("table '{table}' does not exist"))
                })?;
                if def.column(&column.name).is_some() {
                    return Err(invalid(format!(
                        "column '{}' already exists",
                        column.name
                    )));
                }
                def.columns.push(column.clone());
            }
            SchemaOperation::DropColumn { table, column } => {
                let def = table_mut(snapshot, table).ok_or_else(|| {
                    invalid(format!("table '{table}' does not exist"))
                })?;
                if def.column(&column.name).is_none() {
                    return Err(invalid(format!("column '{}' does not exist", column.name)));
                }
                if def.columns.len() == 1 {
                    return Err(invalid("cannot drop the last column of a table".to_string()));
                }
                def.columns.retain(|c| c.name != column.name);
            }
            SchemaOperation::AlterColumn { table, from, to } => {
                if from.name != to.name {
                    return Err(invalid(
                        "alter_column cannot rename; from and to must share a name".to_string(),
                    ));
                }
                let def = table_mut(snapshot, table).ok_or_else(|| {
                    invalid(format!("table '{table}' does not exist"))
                })?;
                let slot = def
                    .columns
                    .iter_mut()
                    .find(|c| c.name == from.name)
                    .ok_or_else(|| invalid(format!("column '{}' does not exist", from.name)))?;
                *slot = to.clone();
            }
            SchemaOperation::RenameTable { from, to } => {
                if snapshot.tables.contains_key(to) {
                    return Err(invalid(format!("table '{to}' already exists")));
                }
                let mut def = snapshot
                    .tables
                    .remove(from)
                    .ok_or_else(|| invalid(format!("table '{from}' does not exist")))?;
                def.name = to.clone();
                snapshot.tables.insert(to.clone(), def);
            }
            SchemaOperation::Execute { .. } => {}
        }
        Ok(())
    }
}

fn table_mut<'a>(snapshot: &'a mut SchemaSnapshot, name: &str) -> Option<&'a mut TableDef> {
    snapshot.tables.get_mut(name)
}

impl fmt::Display for SchemaOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaOperation::CreateTable { table } => write!(f, "create_table {}", table.name),
            SchemaOperation::DropTable { table } => write!(f, "drop_table {}", table.name),
            SchemaOperation::AddColumn { table, column } => {
                write!(f, "add_column {}.{}", table, column.name)
            }
            SchemaOperation::DropColumn { table, column } => {
                write!(f, "drop_column {}.{}", table, column.name)
            }
            SchemaOperation::AlterColumn { table, to, .. } => {
                write!(f, "alter_column {}.{}", table, to.name)
            }
            SchemaOperation::RenameTable { from, to } => {
                write!(f, "rename_table {from} -> {to}")
            }
            SchemaOperation::Execute { .. } => write!(f, "execute"),
        }
    }
}

/// Build the `down` list for a `up` list: inverses in reverse order.
///
/// `Execute` operations have no inverse and are skipped.
pub fn invert_all(ops: &[SchemaOperation]) -> Vec<SchemaOperation> {
    ops.iter().rev().filter_map(SchemaOperation::inverse).collect()
}

#[cfg(test)]
#[path = "operation_test.rs"]
mod tests;

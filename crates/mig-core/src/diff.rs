//! Schema diffing: derive operations that turn one snapshot into another.

use crate::operation::SchemaOperation;
use crate::schema::SchemaSnapshot;

/// Operations that transform `old` into `new`.
///
/// Order is deterministic: created tables (by name), then per surviving
/// table (by name) added, altered and dropped columns, then dropped tables
/// (by name). Renames are never inferred; they show up as drop + create.
pub fn diff_schemas(old: &SchemaSnapshot, new: &SchemaSnapshot) -> Vec<SchemaOperation> {
    let mut ops = Vec::new();

    for (name, table) in &new.tables {
        if !old.tables.contains_key(name) {
            ops.push(SchemaOperation::CreateTable {
                table: table.clone(),
            });
        }
    }

    for (name, new_table) in &new.tables {
        let Some(old_table) = old.tables.get(name) else {
            continue;
        };

        for column in &new_table.columns {
            if old_table.column(&column.name).is_none() {
                ops.push(SchemaOperation::AddColumn {
                    table: name.clone(),
                    column: column.clone(),
                });
            }
        }

        for column in &new_table.columns {
            if let Some(previous) = old_table.column(&column.name) {
                if previous != column {
                    ops.push(SchemaOperation::AlterColumn {
                        table: name.clone(),
                        from: previous.clone(),
                        to: column.clone(),
                    });
                }
            }
        }

        for column in &old_table.columns {
            if new_table.column(&column.name).is_none() {
                ops.push(SchemaOperation::DropColumn {
                    table: name.clone(),
                    column: column.clone(),
                });
            }
        }
    }

    for (name, table) in &old.tables {
        if !new.tables.contains_key(name) {
            ops.push(SchemaOperation::DropTable {
                table: table.clone(),
            });
        }
    }

    ops
}

#[cfg(test)]
#[path = "diff_test.rs"]
mod tests;

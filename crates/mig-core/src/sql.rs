//! SQL emission for schema operations.

use crate::config::Dialect;
use crate::error::{CoreError, CoreResult};
use crate::feasibility::unsupported_reason;
use crate::operation::SchemaOperation;
use crate::schema::{ColumnDef, ColumnType, TableDef};
use crate::sql_utils::quote_ident;

/// Type name for `ty` in `dialect`.
pub fn type_sql(ty: ColumnType, dialect: Dialect) -> String {
    match (ty, dialect) {
        (ColumnType::Integer, _) => "INTEGER".to_string(),
        (ColumnType::BigInt, _) => "BIGINT".to_string(),
        (ColumnType::SmallInt, _) => "SMALLINT".to_string(),
        (ColumnType::Real, _) => "REAL".to_string(),
        (ColumnType::Double, Dialect::DuckDb) => "DOUBLE".to_string(),
        (ColumnType::Double, Dialect::Postgres) => "DOUBLE PRECISION".to_string(),
        (ColumnType::Double, Dialect::Sqlite) => "REAL".to_string(),
        (ColumnType::Boolean, _) => "BOOLEAN".to_string(),
        (ColumnType::Text, _) => "TEXT".to_string(),
        (ColumnType::Varchar(Some(n)), _) => format!("VARCHAR({n})"),
        (ColumnType::Varchar(None), _) => "VARCHAR".to_string(),
        (ColumnType::Decimal { precision, scale }, _) => format!("DECIMAL({precision},{scale})"),
        (ColumnType::Date, _) => "DATE".to_string(),
        (ColumnType::Timestamp, _) => "TIMESTAMP".to_string(),
        (ColumnType::Json, Dialect::Sqlite) => "TEXT".to_string(),
        (ColumnType::Json, _) => "JSON".to_string(),
        (ColumnType::Blob, Dialect::Postgres) => "BYTEA".to_string(),
        (ColumnType::Blob, _) => "BLOB".to_string(),
        (ColumnType::Uuid, Dialect::Sqlite) => "TEXT".to_string(),
        (ColumnType::Uuid, _) => "UUID".to_string(),
    }
}

/// Column definition without key constraints: `"c" TYPE [NOT NULL] [DEFAULT x] [UNIQUE]`
fn column_sql(column: &ColumnDef, dialect: Dialect) -> String {
    let mut sql = format!(
        "{} {}",
        quote_ident(&column.name),
        type_sql(column.data_type, dialect)
    );
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(default) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(default);
    }
    if column.unique {
        sql.push_str(" UNIQUE");
    }
    sql
}

fn create_table_sql(table: &TableDef, dialect: Dialect) -> String {
    let mut parts: Vec<String> = table
        .columns
        .iter()
        .map(|c| column_sql(c, dialect))
        .collect();

    let pk = table.primary_key_columns();
    if !pk.is_empty() {
        let cols: Vec<String> = pk.iter().map(|c| quote_ident(c)).collect();
        parts.push(format!("PRIMARY KEY ({})", cols.join(", ")));
    }

    format!(
        "CREATE TABLE {} ({})",
        quote_ident(&table.name),
        parts.join(", ")
    )
}

fn alter_column_sql(
    table: &str,
    from: &ColumnDef,
    to: &ColumnDef,
    dialect: Dialect,
) -> Vec<String> {
    let prefix = format!(
        "ALTER TABLE {} ALTER COLUMN {}",
        quote_ident(table),
        quote_ident(&to.name)
    );
    let mut statements = Vec::new();

    if from.data_type != to.data_type {
        let keyword = match dialect {
            Dialect::Postgres => "TYPE",
            _ => "SET DATA TYPE",
        };
        statements.push(format!(
            "{prefix} {keyword} {}",
            type_sql(to.data_type, dialect)
        ));
    }

    if from.nullable != to.nullable {
        if to.nullable {
            statements.push(format!("{prefix} DROP NOT NULL"));
        } else {
            statements.push(format!("{prefix} SET NOT NULL"));
        }
    }

    if from.default != to.default {
        match &to.default {
            Some(default) => statements.push(format!("{prefix} SET DEFAULT {default}")),
            None => statements.push(format!("{prefix} DROP DEFAULT")),
        }
    }

    // Only Postgres gets here with a UNIQUE change.
    if from.unique != to.unique {
        let constraint = quote_ident(&format!("{}_{}_key", table, to.name));
        if to.unique {
            statements.push(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
                quote_ident(table),
                constraint,
                quote_ident(&to.name)
            ));
        } else {
            statements.push(format!(
                "ALTER TABLE {} DROP CONSTRAINT {}",
                quote_ident(table),
                constraint
            ));
        }
    }

    statements
}

/// Render one operation as statements for `dialect`.
///
/// Operations the dialect cannot run are an `InfeasibleOperations` error.
pub fn render(op: &SchemaOperation, dialect: Dialect) -> CoreResult<Vec<String>> {
    if let Some(reason) = unsupported_reason(op, dialect) {
        return Err(CoreError::InfeasibleOperations {
            dialect: dialect.to_string(),
            problems: format!("  {op}: {reason}"),
        });
    }

    let statements = match op {
        SchemaOperation::CreateTable { table } => vec![create_table_sql(table, dialect)],
        SchemaOperation::DropTable { table } => {
            vec![format!("DROP TABLE {}", quote_ident(&table.name))]
        }
        SchemaOperation::AddColumn { table, column } => {
            let mut sql = format!(
                "ALTER TABLE {} ADD COLUMN {}",
                quote_ident(table),
                column_sql(column, dialect)
            );
            if column.primary_key {
                sql.push_str(" PRIMARY KEY");
            }
            vec![sql]
        }
        SchemaOperation::DropColumn { table, column } => vec![format!(
            "ALTER TABLE {} DROP COLUMN {}",
            quote_ident(table),
            quote_ident(&column.name)
        )],
        SchemaOperation::AlterColumn { table, from, to } => {
            alter_column_sql(table, from, to, dialect)
        }
        SchemaOperation::RenameTable { from, to } => vec![format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_ident(from),
            quote_ident(to)
        )],
        SchemaOperation::Execute { sql } => {
            let trimmed = sql.trim();
            if trimmed.is_empty() {
                vec![]
            } else {
                vec![trimmed.to_string()]
            }
        }
    };
    Ok(statements)
}

/// Render a list of operations in order.
pub fn render_all(ops: &[SchemaOperation], dialect: Dialect) -> CoreResult<Vec<String>> {
    let mut statements = Vec::new();
    for op in ops {
        statements.extend(render(op, dialect)?);
    }
    Ok(statements)
}

#[cfg(test)]
#[path = "sql_test.rs"]
mod tests;

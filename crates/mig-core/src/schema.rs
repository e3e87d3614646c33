//! Schema model: column types, column and table definitions, and the
//! content-addressed schema snapshot recorded by every revision.

use crate::checksum::compute_checksum;
use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::{default_true, is_false, is_true};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Default precision and scale for a bare `decimal`.
const DEFAULT_DECIMAL: (u32, u32) = (18, 3);

/// Portable column type.
///
/// Parsed case-insensitively from its textual form (`varchar(64)`, `INT8`,
/// `double precision`) and always serialised in canonical lowercase form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColumnType {
    Integer,
    BigInt,
    SmallInt,
    Real,
    Double,
    Boolean,
    Text,
    /// Variable-length string with optional maximum length
    Varchar(Option<u32>),
    Decimal { precision: u32, scale: u32 },
    Date,
    Timestamp,
    Json,
    Blob,
    Uuid,
}

impl FromStr for ColumnType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let invalid = || CoreError::InvalidColumnType {
            value: s.to_string(),
        };

        let (base, args) = match normalized.find('(') {
            Some(open) => {
                let close = normalized.rfind(')').ok_or_else(invalid)?;
                if close != normalized.len() - 1 || close < open {
                    return Err(invalid());
                }
                let args: Vec<u32> = normalized[open + 1..close]
                    .split(',')
                    .map(|a| a.trim().parse::<u32>())
                    .collect::<Result<_, _>>()
                    .map_err(|_| invalid())?;
                (normalized[..open].trim().to_string(), args)
            }
            None => (normalized, Vec::new()),
        };

        let ty = match (base.as_str(), args.as_slice()) {
            ("integer" | "int" | "int4", []) => ColumnType::Integer,
            ("bigint" | "int8", []) => ColumnType::BigInt,
            ("smallint" | "int2", []) => ColumnType::SmallInt,
            ("real" | "float" | "float4", []) => ColumnType::Real,
            ("double" | "double precision" | "float8", []) => ColumnType::Double,
            ("boolean" | "bool", []) => ColumnType::Boolean,
            ("text" | "string", []) => ColumnType::Text,
            ("varchar", []) => ColumnType::Varchar(None),
            ("varchar", [len]) if *len > 0 => ColumnType::Varchar(Some(*len)),
            ("decimal" | "numeric", []) => ColumnType::Decimal {
                precision: DEFAULT_DECIMAL.0,
                scale: DEFAULT_DECIMAL.1,
            },
            ("decimal" | "numeric", [p]) if *p > 0 => ColumnType::Decimal {
                precision: *p,
                scale: 0,
            },
            ("decimal" | "numeric", [p, s]) if *p > 0 && s <= p => ColumnType::Decimal {
                precision: *p,
                scale: *s,
            },
            ("date", []) => ColumnType::Date,
            ("timestamp" | "datetime", []) => ColumnType::Timestamp,
            ("json", []) => ColumnType::Json,
            ("blob" | "bytea", []) => ColumnType::Blob,
            ("uuid", []) => ColumnType::Uuid,
            _ => return Err(invalid()),
        };
        Ok(ty)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Integer => write!(f, "integer"),
            ColumnType::BigInt => write!(f, "bigint"),
            ColumnType::SmallInt => write!(f, "smallint"),
            ColumnType::Real => write!(f, "real"),
            ColumnType::Double => write!(f, "double"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Text => write!(f, "text"),
            ColumnType::Varchar(None) => write!(f, "varchar"),
            ColumnType::Varchar(Some(len)) => write!(f, "varchar({len})"),
            ColumnType::Decimal { precision, scale } => {
                write!(f, "decimal({precision},{scale})")
            }
            ColumnType::Date => write!(f, "date"),
            ColumnType::Timestamp => write!(f, "timestamp"),
            ColumnType::Json => write!(f, "json"),
            ColumnType::Blob => write!(f, "blob"),
            ColumnType::Uuid => write!(f, "uuid"),
        }
    }
}

impl TryFrom<String> for ColumnType {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ColumnType> for String {
    fn from(ty: ColumnType) -> Self {
        ty.to_string()
    }
}

/// A single column definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnDef {
    /// Column name
    pub name: String,

    /// Column type
    #[serde(rename = "type")]
    pub data_type: ColumnType,

    /// Whether NULL values are allowed
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub nullable: bool,

    /// Part of the table's primary key
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary_key: bool,

    /// Single-column UNIQUE constraint
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,

    /// Default value as a SQL expression (emitted verbatim)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl ColumnDef {
    /// Create a nullable column with no constraints.
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            primary_key: false,
            unique: false,
            default: None,
        }
    }

    /// Builder: mark the column `NOT NULL`.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Builder: mark the column as (part of) the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    /// Builder: add a UNIQUE constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Builder: set a default expression.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Whether the key constraints differ between two versions of a column.
    pub fn constraints_differ(&self, other: &ColumnDef) -> bool {
        self.primary_key != other.primary_key || self.unique != other.unique
    }
}

/// A table definition with ordered columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableDef {
    /// Table name
    pub name: String,

    /// Columns in declaration order
    pub columns: Vec<ColumnDef>,
}

impl TableDef {
    /// Create a table from a name and columns.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of the primary key columns, in declaration order.
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Check the table has a name, at least one column, and unique column names.
    pub fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidIdentifier {
                name: self.name.clone(),
                reason: "table name must not be empty".to_string(),
            });
        }
        if self.columns.is_empty() {
            return Err(CoreError::InvalidOperation {
                operation: format!("table {}", self.name),
                reason: "a table needs at least one column".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.name.trim().is_empty() {
                return Err(CoreError::InvalidIdentifier {
                    name: column.name.clone(),
                    reason: format!("column name in table '{}' must not be empty", self.name),
                });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(CoreError::InvalidOperation {
                    operation: format!("table {}", self.name),
                    reason: format!("column '{}' is declared twice", column.name),
                });
            }
        }
        Ok(())
    }
}

/// The full schema at one point in the revision history.
///
/// Tables are kept in a `BTreeMap` so the canonical serialisation (and hence
/// the checksum) does not depend on insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub tables: BTreeMap<String, TableDef>,
}

impl SchemaSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from table definitions, rejecting duplicates.
    pub fn from_tables(tables: impl IntoIterator<Item = TableDef>) -> CoreResult<Self> {
        let mut snapshot = Self::new();
        for table in tables {
            table.validate()?;
            if snapshot.tables.contains_key(&table.name) {
                return Err(CoreError::DuplicateTable {
                    table: table.name,
                    path: "snapshot".to_string(),
                });
            }
            snapshot.tables.insert(table.name.clone(), table);
        }
        Ok(snapshot)
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&TableDef> {
        self.tables.get(name)
    }

    /// Whether the snapshot has no tables
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// SHA-256 of the canonical JSON form.
    pub fn checksum(&self) -> CoreResult<String> {
        let canonical = serde_json::to_string(self)?;
        Ok(compute_checksum(&canonical))
    }
}

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;

//! Declared table models loaded from the project's models directory.

use crate::error::{io_err, CoreError, CoreResult};
use crate::schema::{ColumnDef, SchemaSnapshot, TableDef};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One model file: either a single table or a list of tables.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelFile {
    Single(SingleTable),
    Many(TableList),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SingleTable {
    table: String,
    columns: Vec<ColumnDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableList {
    tables: Vec<TableDef>,
}

impl ModelFile {
    fn into_tables(self) -> Vec<TableDef> {
        match self {
            ModelFile::Single(single) => vec![TableDef::new(single.table, single.columns)],
            ModelFile::Many(list) => list.tables,
        }
    }
}

/// Recursively collect `.yml`/`.yaml` files under `dir`.
fn collect_yaml_files(dir: &Path, out: &mut Vec<PathBuf>) -> CoreResult<()> {
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let path = entry.map_err(|e| io_err(dir, e))?.path();
        if path.is_dir() {
            collect_yaml_files(&path, out)?;
        } else if path.extension().is_some_and(|e| e == "yml" || e == "yaml") {
            out.push(path);
        }
    }
    Ok(())
}

/// Load every declared table under `dir` into a snapshot.
pub fn load_models(dir: &Path) -> CoreResult<SchemaSnapshot> {
    if !dir.is_dir() {
        return Err(CoreError::ConfigInvalid {
            message: format!("models directory not found: {}", dir.display()),
        });
    }

    let mut files = Vec::new();
    collect_yaml_files(dir, &mut files)?;
    files.sort();

    let mut snapshot = SchemaSnapshot::new();
    let mut origins: HashMap<String, PathBuf> = HashMap::new();

    for path in files {
        let content = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let model: ModelFile =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ModelParseError {
                path: path.display().to_string(),
                details: e.to_string(),
            })?;

        for table in model.into_tables() {
            table.validate()?;
            if let Some(first) = origins.get(&table.name) {
                return Err(CoreError::DuplicateTable {
                    table: table.name,
                    path: format!("{} and {}", first.display(), path.display()),
                });
            }
            origins.insert(table.name.clone(), path.clone());
            snapshot.tables.insert(table.name.clone(), table);
        }
    }

    log::debug!(
        "Loaded {} declared table(s) from {}",
        snapshot.tables.len(),
        dir.display()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_single_and_multi_table_files() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "users.yml",
            r#"
table: users
columns:
  - name: id
    type: integer
    primary_key: true
  - name: email
    type: varchar(255)
    nullable: false
    unique: true
"#,
        );
        write(
            dir.path(),
            "blog/content.yaml",
            r#"
tables:
  - name: posts
    columns:
      - { name: id, type: integer, primary_key: true }
      - { name: title, type: text }
  - name: tags
    columns:
      - { name: name, type: text }
"#,
        );

        let snapshot = load_models(dir.path()).unwrap();
        assert_eq!(snapshot.tables.len(), 3);
        let users = snapshot.table("users").unwrap();
        assert_eq!(users.primary_key_columns(), vec!["id"]);
        let email = users.column("email").unwrap();
        assert_eq!(email.data_type, ColumnType::Varchar(Some(255)));
        assert!(!email.nullable);
        assert!(email.unique);
        assert!(snapshot.table("tags").is_some());
    }

    #[test]
    fn test_duplicate_table_across_files() {
        let dir = tempfile::tempdir().unwrap();
        let model = "table: users\ncolumns:\n  - { name: id, type: integer }\n";
        write(dir.path(), "a.yml", model);
        write(dir.path(), "b.yml", model);

        let err = load_models(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateTable { .. }));
    }

    #[test]
    fn test_invalid_type_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "bad.yml",
            "table: t\ncolumns:\n  - { name: id, type: money }\n",
        );
        let err = load_models(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::ModelParseError { .. }));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_models(&dir.path().join("models")).is_err());
    }

    #[test]
    fn test_empty_directory_is_empty_schema() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_models(dir.path()).unwrap().is_empty());
    }
}

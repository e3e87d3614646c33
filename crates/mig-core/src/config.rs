//! Configuration types and parsing for migrations.yml

use crate::error::{io_err, CoreError, CoreResult};
use crate::sql_utils::validate_identifier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config file names searched for in a project directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["migrations.yml", "migrations.yaml"];

/// Environment variable consulted when no `--target` is given.
pub const TARGET_ENV_VAR: &str = "MIGRATIONS_TARGET";

/// Main project configuration from migrations.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Directory holding migration node files
    #[serde(default = "default_versions_path")]
    pub versions_path: String,

    /// Directory holding declared table models
    #[serde(default = "default_models_path")]
    pub models_path: String,

    /// Table in the target database that records applied revisions
    #[serde(default = "default_version_table")]
    pub version_table: String,

    /// SQL dialect used for feasibility checks and SQL emission.
    /// Defaults to the dialect of the configured database type.
    #[serde(default)]
    pub dialect: Option<Dialect>,

    /// How the runner groups revisions into transactions
    #[serde(default)]
    pub transaction_mode: TransactionMode,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Named target configurations (e.g., dev, staging, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Dialect override
    #[serde(default)]
    pub dialect: Option<Dialect>,
}

/// Database type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// DuckDB (default)
    #[default]
    DuckDb,
    /// SQLite
    Sqlite,
}

impl DbType {
    /// The SQL dialect spoken by this backend
    pub fn dialect(&self) -> Dialect {
        match self {
            DbType::DuckDb => Dialect::DuckDb,
            DbType::Sqlite => Dialect::Sqlite,
        }
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbType::DuckDb => write!(f, "duckdb"),
            DbType::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type (duckdb or sqlite)
    #[serde(rename = "type", default)]
    pub db_type: DbType,

    /// Database path (file path or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::default(),
            path: default_db_path(),
        }
    }
}

/// SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// DuckDB SQL dialect
    #[default]
    DuckDb,
    /// SQLite SQL dialect
    Sqlite,
    /// PostgreSQL dialect (SQL emission only)
    Postgres,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::DuckDb => write!(f, "duckdb"),
            Dialect::Sqlite => write!(f, "sqlite"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// Transaction grouping for the runner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
    /// One transaction per revision; earlier revisions stay applied when a
    /// later one fails
    #[default]
    PerRevision,
    /// A single transaction for the whole path
    All,
}

fn default_versions_path() -> String {
    "migrations/versions".to_string()
}

fn default_models_path() -> String {
    "models".to_string()
}

fn default_version_table() -> String {
    "schema_revisions".to_string()
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory.
    /// Looks for migrations.yml or migrations.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists())
            .map(|p| Self::load(&p))
            .unwrap_or_else(|| {
                Err(CoreError::ConfigNotFound {
                    path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
                })
            })
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }
        if self.versions_path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "versions_path cannot be empty".to_string(),
            });
        }
        if self.models_path.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "models_path cannot be empty".to_string(),
            });
        }
        validate_identifier(&self.version_table).map_err(|e| CoreError::ConfigInvalid {
            message: format!("version_table: {e}"),
        })?;
        Ok(())
    }

    /// Absolute path of the versions directory
    pub fn versions_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.versions_path)
    }

    /// Absolute path of the models directory
    pub fn models_path_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.models_path)
    }

    /// Names of all configured targets, sorted
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up a target, failing with the list of known targets
    pub fn get_target(&self, name: &str) -> CoreResult<&TargetConfig> {
        self.targets.get(name).ok_or_else(|| CoreError::UnknownTarget {
            name: name.to_string(),
            available: if self.targets.is_empty() {
                "(none)".to_string()
            } else {
                self.available_targets().join(", ")
            },
        })
    }

    /// Database configuration with the target override applied
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => Ok(self
                .get_target(name)?
                .database
                .clone()
                .unwrap_or_else(|| self.database.clone())),
            None => Ok(self.database.clone()),
        }
    }

    /// Dialect in effect for a target: target override, then the project
    /// setting, then the database type's own dialect.
    pub fn effective_dialect(&self, target: Option<&str>) -> CoreResult<Dialect> {
        let target_config = target.map(|name| self.get_target(name)).transpose()?;
        if let Some(dialect) = target_config.and_then(|t| t.dialect) {
            return Ok(dialect);
        }
        if let Some(dialect) = self.dialect {
            return Ok(dialect);
        }
        Ok(self.get_database_config(target)?.db_type.dialect())
    }

    /// Resolve the target from the CLI flag or the `MIGRATIONS_TARGET`
    /// environment variable
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

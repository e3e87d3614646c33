//! Init command implementation - scaffolds a new migrations project

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::cli::{GlobalArgs, InitArgs, InitDatabase};

/// Execute the init command
pub(crate) async fn execute(args: &InitArgs, global: &GlobalArgs) -> Result<()> {
    // Reject names that could cause path traversal or confusing directory names
    if args.name.contains('/')
        || args.name.contains('\\')
        || args.name.contains("..")
        || args.name.starts_with('.')
        || args.name.starts_with('-')
    {
        anyhow::bail!(
            "Invalid project name '{}': must not contain '/', '\\', '..', or start with '.' or '-'",
            args.name
        );
    }

    let project_dir = Path::new(&global.project_dir).join(&args.name);

    if project_dir.exists() {
        anyhow::bail!(
            "Directory '{}' already exists. Choose a different project name.",
            project_dir.display()
        );
    }

    println!("Creating new migrations project: {}\n", args.name);

    for dir in ["", "models", "migrations/versions"] {
        let path = project_dir.join(dir);
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }

    let (db_type, default_path) = match args.database_type {
        InitDatabase::Duckdb => ("duckdb", "dev.duckdb"),
        InitDatabase::Sqlite => ("sqlite", "dev.sqlite"),
    };
    let db_path = args.database_path.as_deref().unwrap_or(default_path);

    // Escape YAML special characters in interpolated values
    let safe_name = args.name.replace('"', "\\\"");
    let safe_db_path = db_path.replace('"', "\\\"");
    let config_content = format!(
        r#"name: "{name}"

models_path: models
versions_path: migrations/versions
version_table: schema_revisions
transaction_mode: per_revision

database:
  type: {db_type}
  path: "{db_path}"

# targets:
#   prod:
#     database:
#       type: {db_type}
#       path: "prod.{db_type}"
"#,
        name = safe_name,
        db_type = db_type,
        db_path = safe_db_path,
    );
    fs::write(project_dir.join("migrations.yml"), config_content)
        .context("Failed to write migrations.yml")?;

    let example_model = r#"table: users
columns:
  - name: id
    type: integer
    primary_key: true
  - name: email
    type: varchar(255)
    nullable: false
    unique: true
  - name: created_at
    type: timestamp
"#;
    fs::write(project_dir.join("models/users.yml"), example_model)
        .context("Failed to write example model")?;

    println!("  migrations.yml");
    println!("  models/users.yml");
    println!("  migrations/versions/\n");
    println!("Next steps:");
    println!("  cd {}", project_dir.display());
    println!("  migrations generate -m \"create users\"");
    println!("  migrations up");

    Ok(())
}

//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use mig_core::revision::join_revisions;
use mig_core::{Config, Dialect, Project, Target};
use mig_db::{
    open_database, Database, RunReport, RunnerError, RunnerOptions, RunnerResult, StateStore,
};
use std::fmt;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main never prints it.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load a project from the directory specified in global CLI arguments.
pub(crate) fn load_project(global: &GlobalArgs) -> Result<Project> {
    let config_path = global.config.as_deref().map(Path::new);
    let project = Project::load_with_config(Path::new(&global.project_dir), config_path)
        .context("Failed to load project")?;
    log::debug!(
        "Loaded project '{}' from {} ({} revision(s))",
        project.config.name,
        project.root.display(),
        project.graph.len()
    );
    Ok(project)
}

/// Target from `--target` or `MIGRATIONS_TARGET`, checked against the config.
pub(crate) fn resolve_target(config: &Config, global: &GlobalArgs) -> Result<Option<String>> {
    let target = Config::resolve_target(global.target.as_deref());
    if let Some(name) = &target {
        config.get_target(name)?;
    }
    Ok(target)
}

/// Dialect in effect for the selected target
pub(crate) fn dialect(project: &Project, global: &GlobalArgs) -> Result<Dialect> {
    let target = resolve_target(&project.config, global)?;
    Ok(project.config.effective_dialect(target.as_deref())?)
}

/// Open the database for the selected target.
pub(crate) fn open_target_database(
    project: &Project,
    global: &GlobalArgs,
) -> Result<Box<dyn Database>> {
    let target = resolve_target(&project.config, global)?;
    let db_config = project.config.get_database_config(target.as_deref())?;
    open_database(&db_config, &project.root).context("Failed to connect to database")
}

/// State store over the configured version table
pub(crate) fn state_store(project: &Project) -> Result<StateStore> {
    Ok(StateStore::new(project.config.version_table.clone())?)
}

/// Resolve a revision token against the project's graph
pub(crate) fn resolve_revision(project: &Project, token: &str) -> Result<Target> {
    project
        .graph
        .resolve(token)
        .with_context(|| format!("Cannot resolve revision '{token}'"))
}

/// Runner options from the project config
pub(crate) fn runner_options(project: &Project, dry_run: bool) -> RunnerOptions {
    RunnerOptions {
        transaction_mode: project.config.transaction_mode,
        dry_run,
    }
}

/// Print the outcome of an upgrade or downgrade.
///
/// `--sql` prints only the statements. A failed node prints the cause and
/// the revisions that committed before it, then exits with code 1.
pub(crate) fn report_run(result: RunnerResult<RunReport>, sql_only: bool) -> Result<()> {
    match result {
        Ok(report) if sql_only => {
            for sql in &report.sql {
                println!("{sql};");
            }
            Ok(())
        }
        Ok(report) => {
            if report.applied.is_empty() {
                println!("Already at target; nothing to {}.", report.direction.verb());
            }
            for rev in &report.applied {
                println!("{} {rev}", report.direction.past_tense());
            }
            Ok(())
        }
        Err(RunnerError::Failed {
            direction,
            revision,
            source,
            completed,
        }) => {
            eprintln!("Failed to {} {revision}: {source}", direction.verb());
            if completed.is_empty() {
                eprintln!("No revisions were completed.");
            } else {
                eprintln!("Completed: {}", join_revisions(&completed));
            }
            Err(ExitCode(1).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Calculate column widths for table output.
fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.len());
            }
        }
    }
    widths
}

/// Print a simple aligned table with a dash separator under the header.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);

    let header_parts: Vec<String> = headers
        .iter()
        .zip(&widths)
        .map(|(h, &w)| format!("{:<width$}", h, width = w))
        .collect();
    println!("{}", header_parts.join("  ").trim_end());

    let sep_parts: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep_parts.join("  "));

    for row in rows {
        let row_parts: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect();
        println!("{}", row_parts.join("  ").trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_widths_cover_longest_cell() {
        let rows = vec![
            vec!["ae1027a6acf4".to_string(), "x".to_string()],
            vec!["a".to_string(), "longer message".to_string()],
        ];
        assert_eq!(
            calculate_column_widths(&["REVISION", "MESSAGE"], &rows),
            vec![12, 14]
        );
    }

    #[test]
    fn test_exit_code_display_is_empty() {
        assert_eq!(ExitCode(2).to_string(), "");
    }
}

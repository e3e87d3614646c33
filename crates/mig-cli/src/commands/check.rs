//! Check command implementation

use anyhow::{Context, Result};
use mig_core::check_project;
use mig_core::revision::join_revisions;

use crate::cli::{CheckArgs, GlobalArgs};
use crate::commands::common::{self, ExitCode};

/// Execute the check command
pub(crate) async fn execute(_args: &CheckArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let report = check_project(&project).context("Failed to check project")?;

    if report.has_multiple_heads() {
        println!(
            "Multiple heads: {}. Run `migrations merge` to join them.",
            join_revisions(&report.heads)
        );
    }

    if !report.drift.is_empty() {
        println!("Models differ from the head snapshot. Run `migrations generate`:");
        for op in &report.drift {
            println!("  {op}");
        }
    }

    if !report.inconsistent.is_empty() {
        println!("Inconsistent revisions:");
        for line in &report.inconsistent {
            println!("  {line}");
        }
    }

    if !report.is_clean() {
        return Err(ExitCode(2).into());
    }

    match report.heads.first() {
        Some(head) => println!("OK: single head {head}; models match the head snapshot."),
        None => println!("OK: no revisions and no declared models."),
    }
    Ok(())
}

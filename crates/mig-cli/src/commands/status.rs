//! Status command implementation

use anyhow::{Context, Result};
use mig_core::revision::join_revisions;
use mig_core::RevisionGraph;
use mig_db::{Runner, StatusReport};
use serde::Serialize;

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common;

/// One applied revision as printed by `status`
#[derive(Debug, Serialize)]
struct AppliedEntry {
    revision: String,
    applied_at: String,
    message: Option<String>,
    /// `false` when the node file's snapshot checksum no longer matches the
    /// one recorded at apply time
    checksum_matches: Option<bool>,
}

/// JSON shape of `status -o json`
#[derive(Debug, Serialize)]
struct StatusOutput {
    current: Vec<String>,
    pending: Vec<String>,
    unknown: Vec<String>,
    applied: Vec<AppliedEntry>,
}

/// Execute the status command
pub(crate) async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let db = common::open_target_database(&project, global)?;

    let runner = Runner::new(
        db.as_ref(),
        &project.graph,
        common::state_store(&project)?,
        common::runner_options(&project, false),
    );
    let report = runner.status().await.context("Failed to read applied revisions")?;
    let output = build_output(&project.graph, &report);

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Table => print_text(&output, &report),
    }
    Ok(())
}

fn build_output(graph: &RevisionGraph, report: &StatusReport) -> StatusOutput {
    let applied = report
        .applied
        .iter()
        .map(|a| {
            let node = graph.get(&a.revision);
            AppliedEntry {
                revision: a.revision.to_string(),
                applied_at: a.applied_at.clone(),
                message: node.map(|n| n.message.clone()),
                checksum_matches: node.map(|n| n.snapshot_checksum == a.snapshot_checksum),
            }
        })
        .collect();

    StatusOutput {
        current: report.heads.iter().map(|r| r.to_string()).collect(),
        pending: report.pending.iter().map(|r| r.to_string()).collect(),
        unknown: report.unknown.iter().map(|r| r.to_string()).collect(),
        applied,
    }
}

fn print_text(output: &StatusOutput, report: &StatusReport) {
    if report.heads.is_empty() {
        println!("Current: base (nothing applied)");
    } else {
        println!("Current: {}", join_revisions(&report.heads));
    }
    println!("Pending: {} revision(s)", report.pending.len());
    for rev in &report.pending {
        println!("  {rev}");
    }

    if !report.unknown.is_empty() {
        println!(
            "Unknown: {} (recorded in the database, missing from the versions directory)",
            join_revisions(&report.unknown)
        );
    }

    if output.applied.is_empty() {
        return;
    }
    println!();
    let rows: Vec<Vec<String>> = output
        .applied
        .iter()
        .map(|a| {
            let note = match a.checksum_matches {
                Some(true) => "",
                Some(false) => "snapshot changed",
                None => "unknown",
            };
            vec![
                a.revision.clone(),
                a.applied_at.clone(),
                a.message.clone().unwrap_or_default(),
                note.to_string(),
            ]
        })
        .collect();
    common::print_table(&["REVISION", "APPLIED_AT", "MESSAGE", "NOTE"], &rows);
}

//! History command implementation

use anyhow::{Context, Result};
use mig_core::revision::join_revisions;
use mig_core::{RevisionGraph, RevisionId};
use serde::Serialize;
use std::collections::HashSet;

use crate::cli::{GlobalArgs, HistoryArgs, OutputFormat};
use crate::commands::common;

/// One node as printed by `history`
#[derive(Debug, Serialize)]
struct HistoryEntry {
    revision: String,
    revises: Vec<String>,
    message: String,
    created_at: String,
    head: bool,
    merge: bool,
    root: bool,
    /// `None` with `--offline`
    applied: Option<bool>,
}

/// Execute the history command
pub(crate) async fn execute(args: &HistoryArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;

    let applied = if args.offline {
        None
    } else {
        let db = common::open_target_database(&project, global)?;
        let store = common::state_store(&project)?;
        Some(
            store
                .applied_set(db.as_ref())
                .await
                .context("Failed to read applied revisions")?,
        )
    };

    let entries = build_entries(&project.graph, applied.as_ref());

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Table => print_table(&entries),
    }
    Ok(())
}

fn build_entries(
    graph: &RevisionGraph,
    applied: Option<&HashSet<RevisionId>>,
) -> Vec<HistoryEntry> {
    let heads: HashSet<RevisionId> = graph.heads().into_iter().collect();
    graph
        .history()
        .into_iter()
        .map(|node| HistoryEntry {
            revision: node.revision.to_string(),
            revises: node.revises.iter().map(|r| r.to_string()).collect(),
            message: node.message.clone(),
            created_at: node.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            head: heads.contains(&node.revision),
            merge: node.is_merge(),
            root: node.is_root(),
            applied: applied.map(|set| set.contains(&node.revision)),
        })
        .collect()
}

fn print_table(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        println!("No revisions found.");
        return;
    }

    let rows: Vec<Vec<String>> = entries
        .iter()
        .map(|e| {
            let mut flags = Vec::new();
            if e.head {
                flags.push("head");
            }
            if e.merge {
                flags.push("merge");
            }
            if e.root {
                flags.push("root");
            }
            let applied = match e.applied {
                Some(true) => "yes",
                Some(false) => "no",
                None => "-",
            };
            let parents = if e.revises.is_empty() {
                "base".to_string()
            } else {
                e.revises.join(", ")
            };
            vec![
                e.revision.clone(),
                parents,
                flags.join(","),
                applied.to_string(),
                e.created_at.clone(),
                e.message.clone(),
            ]
        })
        .collect();
    common::print_table(
        &["REVISION", "REVISES", "FLAGS", "APPLIED", "CREATED", "MESSAGE"],
        &rows,
    );
}

/// Comma-separated heads, used by `heads` as well
pub(crate) fn heads_line(graph: &RevisionGraph) -> String {
    join_revisions(&graph.heads())
}

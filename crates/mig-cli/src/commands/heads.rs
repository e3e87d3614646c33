//! Heads command implementation

use anyhow::Result;
use serde::Serialize;

use crate::cli::{GlobalArgs, HeadsArgs, OutputFormat};
use crate::commands::{common, history};

#[derive(Debug, Serialize)]
struct HeadEntry {
    revision: String,
    message: String,
    created_at: String,
}

/// Execute the heads command
pub(crate) async fn execute(args: &HeadsArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let graph = &project.graph;

    let entries: Vec<HeadEntry> = graph
        .heads()
        .iter()
        .filter_map(|rev| graph.get(rev))
        .map(|node| HeadEntry {
            revision: node.revision.to_string(),
            message: node.message.clone(),
            created_at: node.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect();

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("No revisions found.");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|e| vec![e.revision.clone(), e.created_at.clone(), e.message.clone()])
                .collect();
            common::print_table(&["REVISION", "CREATED", "MESSAGE"], &rows);
            if entries.len() > 1 {
                println!(
                    "\nMultiple heads ({}); run `migrations merge` to join them.",
                    history::heads_line(graph)
                );
            }
        }
    }
    Ok(())
}

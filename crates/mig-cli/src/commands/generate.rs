//! Generate command implementation

use anyhow::{Context, Result};
use mig_core::GenerateOutcome;

use crate::cli::{GenerateArgs, GlobalArgs};
use crate::commands::common;

/// Execute the generate command
pub(crate) async fn execute(args: &GenerateArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let dialect = common::dialect(&project, global)?;

    let outcome = mig_core::generate(&project, &args.message, dialect, args.allow_empty)
        .context("Failed to generate revision")?;

    match outcome {
        GenerateOutcome::NoChanges => {
            println!("No changes detected; nothing written.");
            Ok(())
        }
        GenerateOutcome::Written(node) => {
            let path = node
                .path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            println!("Generated revision {} ({})", node.revision, path);
            for op in &node.up {
                println!("  {op}");
            }
            Ok(())
        }
    }
}

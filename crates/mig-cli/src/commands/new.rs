//! New command implementation - writes an empty revision

use anyhow::{Context, Result};

use crate::cli::{GlobalArgs, NewArgs};
use crate::commands::common;

/// Execute the new command
pub(crate) async fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;
    let node =
        mig_core::new_revision(&project, &args.message).context("Failed to create revision")?;
    let path = node
        .path
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    println!("Created empty revision {} ({})", node.revision, path);
    Ok(())
}

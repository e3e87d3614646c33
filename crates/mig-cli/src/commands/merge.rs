//! Merge command implementation

use anyhow::{Context, Result};
use mig_core::revision::join_revisions;
use mig_core::{RevisionId, Target};

use crate::cli::{GlobalArgs, MergeArgs};
use crate::commands::common;

/// Execute the merge command
pub(crate) async fn execute(args: &MergeArgs, global: &GlobalArgs) -> Result<()> {
    let project = common::load_project(global)?;

    let mut heads: Vec<RevisionId> = Vec::with_capacity(args.revisions.len());
    for token in &args.revisions {
        match common::resolve_revision(&project, token)? {
            Target::Revision(rev) => heads.push(rev),
            other => anyhow::bail!("'{other}' cannot be merged; name revisions explicitly"),
        }
    }

    let node =
        mig_core::merge(&project, &heads, &args.message).context("Failed to merge heads")?;
    println!(
        "Merged {} into revision {}",
        join_revisions(&node.revises),
        node.revision
    );
    Ok(())
}

//! Node authoring: autogenerate from the model diff, empty nodes, merges.

use crate::config::Dialect;
use crate::diff::diff_schemas;
use crate::error::{CoreError, CoreResult};
use crate::feasibility::ensure_feasible;
use crate::graph::RevisionGraph;
use crate::node::MigrationNode;
use crate::operation::invert_all;
use crate::project::Project;
use crate::revision::{join_revisions, RevisionId};
use crate::schema::{SchemaSnapshot, TableDef};
use std::collections::BTreeSet;

/// Result of [`generate`]
#[derive(Debug)]
pub enum GenerateOutcome {
    /// A node was written; `path` is set
    Written(Box<MigrationNode>),
    /// The declared models match the head snapshot
    NoChanges,
}

/// Autogenerate a node from the difference between the head snapshot and
/// the declared models.
///
/// Nothing is written when the diff is empty (unless `allow_empty`) or when
/// any operation is infeasible on `dialect`.
pub fn generate(
    project: &Project,
    message: &str,
    dialect: Dialect,
    allow_empty: bool,
) -> CoreResult<GenerateOutcome> {
    let head = project.graph.single_head()?;
    let parent = project.head_snapshot()?;
    let declared = project.declared_schema()?;

    let up = diff_schemas(&parent, &declared);
    if up.is_empty() && !allow_empty {
        log::debug!("Declared models match the head snapshot");
        return Ok(GenerateOutcome::NoChanges);
    }
    let down = invert_all(&up);
    ensure_feasible(&up, &down, dialect)?;

    let mut snapshot = parent;
    for op in &up {
        op.apply_to(&mut snapshot)?;
    }

    let node = MigrationNode::new(head.into_iter().collect(), message, up, down, snapshot)?;
    let node = write_node(project, node)?;
    log::info!(
        "Generated revision {} with {} operation(s)",
        node.revision,
        node.up.len()
    );
    Ok(GenerateOutcome::Written(Box::new(node)))
}

/// Write an empty node on top of the single head.
pub fn new_revision(project: &Project, message: &str) -> CoreResult<MigrationNode> {
    let head = project.graph.single_head()?;
    let snapshot = project.head_snapshot()?;
    let node = MigrationNode::new(head.into_iter().collect(), message, vec![], vec![], snapshot)?;
    write_node(project, node)
}

/// Write a merge node revising `heads`, or every current head when empty.
pub fn merge(project: &Project, heads: &[RevisionId], message: &str) -> CoreResult<MigrationNode> {
    let mut parents: Vec<RevisionId> = if heads.is_empty() {
        project.graph.heads()
    } else {
        heads.to_vec()
    };
    parents.sort();
    parents.dedup();

    if parents.len() < 2 {
        let reason = match parents.first() {
            None => "the revision graph is empty".to_string(),
            Some(one) => format!("only one head ({one})"),
        };
        return Err(CoreError::NothingToMerge { reason });
    }

    for rev in &parents {
        if !project.graph.contains(rev) {
            return Err(CoreError::UnknownRevision {
                revision: rev.to_string(),
            });
        }
    }
    for rev in &parents {
        let ancestors = project.graph.ancestors(rev);
        if let Some(other) = parents.iter().find(|p| ancestors.contains(*p)) {
            return Err(CoreError::NothingToMerge {
                reason: format!("{other} is already an ancestor of {rev}"),
            });
        }
    }

    let snapshot = merge_snapshots(&project.graph, &parents)?;
    let node = MigrationNode::new(parents, message, vec![], vec![], snapshot)?;
    let node = write_node(project, node)?;
    log::info!(
        "Merged {} into revision {}",
        join_revisions(&node.revises),
        node.revision
    );
    Ok(node)
}

/// Three-way merge of the parents' snapshots against their merge base.
///
/// A table left as it was in the base by every parent keeps the base
/// definition. A table changed (added, altered or dropped) by some parents
/// takes the changed version when they all agree, and is a `MergeConflict`
/// otherwise. Several merge bases are merged recursively into one.
pub fn merge_snapshots(
    graph: &RevisionGraph,
    parents: &[RevisionId],
) -> CoreResult<SchemaSnapshot> {
    let mut sides: Vec<(&RevisionId, &SchemaSnapshot)> = Vec::with_capacity(parents.len());
    for rev in parents {
        let node = graph.get(rev).ok_or_else(|| CoreError::UnknownRevision {
            revision: rev.to_string(),
        })?;
        sides.push((rev, &node.snapshot));
    }

    let base = match graph.merge_bases(parents).as_slice() {
        [] => SchemaSnapshot::new(),
        [single] => graph
            .get(single)
            .map(|node| node.snapshot.clone())
            .unwrap_or_default(),
        many => merge_snapshots(graph, many)?,
    };

    let names: BTreeSet<&String> = base
        .tables
        .keys()
        .chain(sides.iter().flat_map(|(_, snap)| snap.tables.keys()))
        .collect();

    let mut merged = SchemaSnapshot::new();
    for name in names {
        let original = base.tables.get(name);
        let mut chosen: Option<(&RevisionId, Option<&TableDef>)> = None;
        for (rev, snap) in &sides {
            let version = snap.tables.get(name);
            if version == original {
                continue;
            }
            match chosen {
                None => chosen = Some((*rev, version)),
                Some((_, agreed)) if agreed == version => {}
                Some((left, _)) => {
                    return Err(CoreError::MergeConflict {
                        table: name.clone(),
                        left: left.to_string(),
                        right: rev.to_string(),
                    });
                }
            }
        }

        let result = match chosen {
            Some((_, version)) => version,
            None => original,
        };
        if let Some(table) = result {
            merged.tables.insert(name.clone(), table.clone());
        }
    }
    Ok(merged)
}

fn write_node(project: &Project, mut node: MigrationNode) -> CoreResult<MigrationNode> {
    let path = node.save(&project.versions_dir())?;
    node.path = Some(path);
    Ok(node)
}

#[cfg(test)]
#[path = "generate_test.rs"]
mod tests;

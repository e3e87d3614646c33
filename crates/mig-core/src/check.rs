//! Consistency checks over a loaded project.

use crate::diff::diff_schemas;
use crate::error::CoreResult;
use crate::generate::merge_snapshots;
use crate::operation::SchemaOperation;
use crate::project::Project;
use crate::revision::RevisionId;
use crate::schema::SchemaSnapshot;

/// Findings of [`check_project`]
#[derive(Debug, Default)]
pub struct CheckReport {
    /// Graph heads; more than one is a conflict
    pub heads: Vec<RevisionId>,
    /// Operations still needed to reach the declared models from the head
    /// snapshot. Empty when the graph has several heads.
    pub drift: Vec<SchemaOperation>,
    /// Nodes whose operations do not reproduce their stored snapshot
    pub inconsistent: Vec<String>,
}

impl CheckReport {
    /// Whether the graph has more than one head
    pub fn has_multiple_heads(&self) -> bool {
        self.heads.len() > 1
    }

    /// No conflicts, drift, or inconsistent nodes
    pub fn is_clean(&self) -> bool {
        !self.has_multiple_heads() && self.drift.is_empty() && self.inconsistent.is_empty()
    }
}

/// Check heads, model drift, and that every node's `up` replays onto its
/// parent snapshot to give the stored snapshot and `down` brings it back.
pub fn check_project(project: &Project) -> CoreResult<CheckReport> {
    let graph = &project.graph;
    let mut report = CheckReport {
        heads: graph.heads(),
        ..Default::default()
    };

    if !report.has_multiple_heads() {
        let declared = project.declared_schema()?;
        report.drift = diff_schemas(&project.head_snapshot()?, &declared);
    }

    for rev in graph.topological_order() {
        let Some(node) = graph.get(&rev) else {
            continue;
        };
        let parent = match node.revises.as_slice() {
            [] => SchemaSnapshot::new(),
            [single] => graph
                .get(single)
                .map(|p| p.snapshot.clone())
                .unwrap_or_default(),
            many => match merge_snapshots(graph, many) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    report.inconsistent.push(format!("{rev}: {e}"));
                    continue;
                }
            },
        };

        match node.replay(&parent) {
            Ok(replayed) if !diff_schemas(&replayed, &node.snapshot).is_empty() => {
                report
                    .inconsistent
                    .push(format!("{rev}: up operations do not produce the stored snapshot"));
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                report.inconsistent.push(format!("{rev}: up: {e}"));
                continue;
            }
        }

        let mut reverted = node.snapshot.clone();
        let down_result = node.down.iter().try_for_each(|op| op.apply_to(&mut reverted));
        match down_result {
            Ok(()) if !diff_schemas(&reverted, &parent).is_empty() => {
                report
                    .inconsistent
                    .push(format!("{rev}: down operations do not restore the parent snapshot"));
            }
            Ok(()) => {}
            Err(e) => report.inconsistent.push(format!("{rev}: down: {e}")),
        }
    }

    Ok(report)
}

#[cfg(test)]
#[path = "check_test.rs"]
mod tests;

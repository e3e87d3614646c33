//! Revision graph building, validation, and path planning

use crate::error::{CoreError, CoreResult};
use crate::node::MigrationNode;
use crate::revision::{join_revisions, RevisionId, MIN_PREFIX_LEN};
use chrono::{DateTime, Utc};
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Symbolic token for the newest revision
pub const HEAD: &str = "head";
/// Symbolic token for every head at once
pub const HEADS: &str = "heads";
/// Symbolic token for the empty schema before the root
pub const BASE: &str = "base";

/// A resolved upgrade or downgrade target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Before the root revision
    Base,
    /// Every head of a branched graph
    Heads,
    /// A single revision
    Revision(RevisionId),
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Target::Base => f.write_str(BASE),
            Target::Heads => f.write_str(HEADS),
            Target::Revision(rev) => write!(f, "{rev}"),
        }
    }
}

/// Directed acyclic graph of revisions; edges point from parent to child.
#[derive(Debug)]
pub struct RevisionGraph {
    graph: DiGraph<RevisionId, ()>,
    node_map: HashMap<RevisionId, NodeIndex>,
    nodes: HashMap<RevisionId, MigrationNode>,
}

impl RevisionGraph {
    /// Build and validate the graph from loaded nodes.
    pub fn build(nodes: Vec<MigrationNode>) -> CoreResult<Self> {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::with_capacity(nodes.len());
        let mut by_id: HashMap<RevisionId, MigrationNode> = HashMap::with_capacity(nodes.len());

        for node in nodes {
            if let Some(existing) = by_id.get(&node.revision) {
                return Err(CoreError::DuplicateRevision {
                    revision: node.revision.to_string(),
                    path1: display_path(existing),
                    path2: display_path(&node),
                });
            }
            let idx = graph.add_node(node.revision.clone());
            node_map.insert(node.revision.clone(), idx);
            by_id.insert(node.revision.clone(), node);
        }

        for node in by_id.values() {
            let child = node_map[&node.revision];
            for parent in &node.revises {
                let Some(&parent_idx) = node_map.get(parent) else {
                    return Err(CoreError::MissingParent {
                        revision: node.revision.to_string(),
                        parent: parent.to_string(),
                    });
                };
                graph.add_edge(parent_idx, child, ());
            }
        }

        let revision_graph = Self {
            graph,
            node_map,
            nodes: by_id,
        };
        revision_graph.validate()?;
        Ok(revision_graph)
    }

    /// Check for cycles and for exactly one root.
    fn validate(&self) -> CoreResult<()> {
        if let Err(cycle) = toposort(&self.graph, None) {
            return Err(CoreError::CircularRevision {
                cycle: self.find_cycle_path(cycle.node_id()),
            });
        }
        let roots = self.roots();
        if !self.is_empty() && roots.len() != 1 {
            return Err(CoreError::MultipleRoots {
                roots: join_revisions(&roots),
            });
        }
        Ok(())
    }

    /// A closed cycle path for error reporting, taken from the strongly
    /// connected component that contains `start` when it is cyclic.
    fn find_cycle_path(&self, start: NodeIndex) -> String {
        let cyclic: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .collect();
        let Some(component) = cyclic
            .iter()
            .find(|scc| scc.contains(&start))
            .or_else(|| cyclic.first())
        else {
            return self.graph[start].to_string();
        };

        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let begin = if members.contains(&start) {
            start
        } else {
            component[0]
        };

        // Every member of a cyclic component has an outgoing edge inside it,
        // so the walk always closes.
        let mut path = vec![begin];
        let mut position: HashMap<NodeIndex, usize> = HashMap::from([(begin, 0)]);
        let mut current = begin;
        while let Some(next) = self
            .graph
            .edges(current)
            .map(|edge| edge.target())
            .find(|target| members.contains(target))
        {
            if let Some(&i) = position.get(&next) {
                path.drain(..i);
                path.push(next);
                break;
            }
            position.insert(next, path.len());
            path.push(next);
            current = next;
        }

        path.iter()
            .map(|idx| self.graph[*idx].to_string())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Whether the graph has no revisions
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of revisions
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node by exact revision id
    pub fn get(&self, revision: &str) -> Option<&MigrationNode> {
        self.nodes.get(revision)
    }

    /// Whether the graph contains a revision
    pub fn contains(&self, revision: &str) -> bool {
        self.nodes.contains_key(revision)
    }

    /// Revisions with no parent, sorted
    pub fn roots(&self) -> Vec<RevisionId> {
        self.collect_sorted(|idx| {
            self.graph
                .neighbors_directed(idx, Direction::Incoming)
                .next()
                .is_none()
        })
    }

    /// Revisions with no child, sorted
    pub fn heads(&self) -> Vec<RevisionId> {
        self.collect_sorted(|idx| {
            self.graph
                .neighbors_directed(idx, Direction::Outgoing)
                .next()
                .is_none()
        })
    }

    fn collect_sorted(&self, pred: impl Fn(NodeIndex) -> bool) -> Vec<RevisionId> {
        let mut out: Vec<RevisionId> = self
            .graph
            .node_indices()
            .filter(|&idx| pred(idx))
            .map(|idx| self.graph[idx].clone())
            .collect();
        out.sort();
        out
    }

    /// The only head, `None` for an empty graph, or `MultipleHeads`.
    pub fn single_head(&self) -> CoreResult<Option<RevisionId>> {
        let mut heads = self.heads();
        match heads.len() {
            0 => Ok(None),
            1 => Ok(heads.pop()),
            _ => Err(CoreError::MultipleHeads {
                heads: join_revisions(&heads),
            }),
        }
    }

    /// Direct parents of a revision
    pub fn parents(&self, revision: &str) -> Vec<RevisionId> {
        self.neighbors(revision, Direction::Incoming)
    }

    /// Direct children of a revision
    pub fn children(&self, revision: &str) -> Vec<RevisionId> {
        self.neighbors(revision, Direction::Outgoing)
    }

    fn neighbors(&self, revision: &str, direction: Direction) -> Vec<RevisionId> {
        let Some(&idx) = self.node_map.get(revision) else {
            return Vec::new();
        };
        let mut out: Vec<RevisionId> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].clone())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// All transitive parents of a revision, excluding itself
    pub fn ancestors(&self, revision: &str) -> HashSet<RevisionId> {
        self.reachable(revision, Direction::Incoming)
    }

    /// All transitive parents of a revision, including itself
    pub fn ancestors_inclusive(&self, revision: &str) -> HashSet<RevisionId> {
        let mut set = self.ancestors(revision);
        if let Some(node) = self.nodes.get(revision) {
            set.insert(node.revision.clone());
        }
        set
    }

    /// Lowest common ancestors of `revisions`, sorted. Each revision counts
    /// as its own ancestor; criss-cross histories can have several.
    pub fn merge_bases(&self, revisions: &[RevisionId]) -> Vec<RevisionId> {
        let mut sets = revisions.iter().map(|rev| self.ancestors_inclusive(rev));
        let Some(mut common) = sets.next() else {
            return Vec::new();
        };
        for set in sets {
            common.retain(|rev| set.contains(rev));
        }

        let mut bases: Vec<RevisionId> = common
            .iter()
            .filter(|candidate| {
                !common
                    .iter()
                    .any(|other| other != *candidate && self.ancestors(other).contains(*candidate))
            })
            .cloned()
            .collect();
        bases.sort();
        bases
    }

    /// All transitive children of a revision, excluding itself
    pub fn descendants(&self, revision: &str) -> HashSet<RevisionId> {
        self.reachable(revision, Direction::Outgoing)
    }

    fn reachable(&self, revision: &str, direction: Direction) -> HashSet<RevisionId> {
        let mut result = HashSet::new();
        let Some(&start) = self.node_map.get(revision) else {
            return result;
        };
        let mut stack = vec![start];
        let mut visited = HashSet::new();
        visited.insert(start);
        while let Some(idx) = stack.pop() {
            for neighbor in self.graph.neighbors_directed(idx, direction) {
                if visited.insert(neighbor) {
                    result.insert(self.graph[neighbor].clone());
                    stack.push(neighbor);
                }
            }
        }
        result
    }

    /// Revisions parents-first; ties broken by creation time, then id.
    pub fn topological_order(&self) -> Vec<RevisionId> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                let degree = self
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count();
                (idx, degree)
            })
            .collect();

        let key = |idx: NodeIndex| -> (DateTime<Utc>, RevisionId) {
            let id = self.graph[idx].clone();
            let created = self.nodes[&id].created_at;
            (created, id)
        };

        let mut ready: BTreeSet<(DateTime<Utc>, RevisionId)> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(&idx, _)| key(idx))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(next) = ready.pop_first() {
            let idx = self.node_map[&next.1];
            for child in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(d) = in_degree.get_mut(&child) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(key(child));
                    }
                }
            }
            order.push(next.1);
        }
        order
    }

    /// Revisions newest first
    pub fn history(&self) -> Vec<&MigrationNode> {
        self.topological_order()
            .iter()
            .rev()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    /// Resolve a user-supplied token: `head`, `heads`, `base`, a full
    /// revision id, or an unambiguous prefix of at least four characters.
    pub fn resolve(&self, token: &str) -> CoreResult<Target> {
        match token {
            BASE => return Ok(Target::Base),
            HEADS => return Ok(Target::Heads),
            HEAD => {
                return Ok(match self.single_head()? {
                    Some(head) => Target::Revision(head),
                    None => Target::Base,
                })
            }
            _ => {}
        }

        if let Some(node) = self.nodes.get(token) {
            return Ok(Target::Revision(node.revision.clone()));
        }

        let unknown = || CoreError::UnknownRevision {
            revision: token.to_string(),
        };
        if token.len() < MIN_PREFIX_LEN {
            return Err(unknown());
        }

        let mut candidates: Vec<&RevisionId> = self
            .nodes
            .keys()
            .filter(|id| id.matches_prefix(token))
            .collect();
        candidates.sort();
        match candidates.as_slice() {
            [] => Err(unknown()),
            [only] => Ok(Target::Revision((*only).clone())),
            many => Err(CoreError::AmbiguousRevision {
                prefix: token.to_string(),
                candidates: join_revisions(many.iter().copied()),
            }),
        }
    }

    /// Applied revisions with no applied child
    pub fn applied_heads(&self, applied: &HashSet<RevisionId>) -> Vec<RevisionId> {
        let mut heads: Vec<RevisionId> = applied
            .iter()
            .filter(|rev| self.contains(rev))
            .filter(|rev| !self.children(rev).iter().any(|c| applied.contains(c)))
            .cloned()
            .collect();
        heads.sort();
        heads
    }

    /// Revisions to apply, in order, to reach `target` from `applied`.
    pub fn upgrade_path(
        &self,
        applied: &HashSet<RevisionId>,
        target: &Target,
    ) -> CoreResult<Vec<RevisionId>> {
        let wanted: HashSet<RevisionId> = match target {
            Target::Base => HashSet::new(),
            Target::Heads => self
                .heads()
                .iter()
                .flat_map(|h| self.ancestors_inclusive(h))
                .collect(),
            Target::Revision(rev) => {
                if !self.contains(rev) {
                    return Err(CoreError::UnknownRevision {
                        revision: rev.to_string(),
                    });
                }
                self.ancestors_inclusive(rev)
            }
        };

        Ok(self
            .topological_order()
            .into_iter()
            .filter(|rev| wanted.contains(rev) && !applied.contains(rev))
            .collect())
    }

    /// Revisions to revert, in order, to bring `applied` back to `target`.
    pub fn downgrade_path(
        &self,
        applied: &HashSet<RevisionId>,
        target: &Target,
    ) -> CoreResult<Vec<RevisionId>> {
        let keep: HashSet<RevisionId> = match target {
            Target::Base => HashSet::new(),
            Target::Heads => {
                return Err(CoreError::InvalidDowngradeTarget {
                    target: HEADS.to_string(),
                })
            }
            Target::Revision(rev) => {
                if !self.contains(rev) {
                    return Err(CoreError::UnknownRevision {
                        revision: rev.to_string(),
                    });
                }
                if !applied.contains(rev) {
                    return Err(CoreError::NotApplied {
                        revision: rev.to_string(),
                    });
                }
                self.ancestors_inclusive(rev)
            }
        };

        let mut order: Vec<RevisionId> = self
            .topological_order()
            .into_iter()
            .filter(|rev| applied.contains(rev) && !keep.contains(rev))
            .collect();
        order.reverse();
        Ok(order)
    }

    /// Revisions still to apply to reach every head
    pub fn pending(&self, applied: &HashSet<RevisionId>) -> Vec<RevisionId> {
        self.upgrade_path(applied, &Target::Heads)
            .unwrap_or_default()
    }
}

fn display_path(node: &MigrationNode) -> String {
    node.path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(in memory)".to_string())
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod tests;

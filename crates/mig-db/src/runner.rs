//! Applies and reverts migration nodes against a database.

use crate::error::DbError;
use crate::state::{AppliedRevision, StateStore};
use crate::traits::Database;
use mig_core::feasibility::{check_operations, into_result, Infeasibility};
use mig_core::revision::join_revisions;
use mig_core::sql::render_all;
use mig_core::{CoreError, RevisionGraph, RevisionId, Target, TransactionMode};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Upgrade or downgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Apply `up` operations
    Upgrade,
    /// Apply `down` operations
    Downgrade,
}

impl Direction {
    /// Verb used in messages
    pub fn verb(&self) -> &'static str {
        match self {
            Direction::Upgrade => "apply",
            Direction::Downgrade => "revert",
        }
    }

    /// Past tense used in progress lines
    pub fn past_tense(&self) -> &'static str {
        match self {
            Direction::Upgrade => "Applied",
            Direction::Downgrade => "Reverted",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Upgrade => write!(f, "upgrade"),
            Direction::Downgrade => write!(f, "downgrade"),
        }
    }
}

/// Runner errors
#[derive(Error, Debug)]
pub enum RunnerError {
    /// Planning failed: bad target, graph problem, or infeasible operations
    #[error("[R001] {0}")]
    Core(#[from] CoreError),

    /// Database error outside a node's transaction
    #[error("[R002] {0}")]
    Db(#[from] DbError),

    /// A node's transaction failed and was rolled back
    #[error("[R003] Failed to {} {revision}: {source}", .direction.verb())]
    Failed {
        direction: Direction,
        revision: RevisionId,
        #[source]
        source: DbError,
        /// Revisions that committed before the failure
        completed: Vec<RevisionId>,
    },
}

/// Result type alias for RunnerError
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Runner behavior switches
#[derive(Debug, Clone, Copy, Default)]
pub struct RunnerOptions {
    /// Transaction grouping
    pub transaction_mode: TransactionMode,
    /// Emit SQL without executing anything
    pub dry_run: bool,
}

/// Outcome of an upgrade or downgrade
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Which way the run went
    pub direction: Direction,
    /// Revisions applied or reverted, in execution order. For a dry run,
    /// the revisions that would be.
    pub applied: Vec<RevisionId>,
    /// Every statement executed (or that would be)
    pub sql: Vec<String>,
}

/// Database state compared with the graph
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Recorded revisions, oldest first
    pub applied: Vec<AppliedRevision>,
    /// Applied revisions with no applied child
    pub heads: Vec<RevisionId>,
    /// Revisions still to apply to reach every graph head
    pub pending: Vec<RevisionId>,
    /// Recorded revisions with no node in the graph
    pub unknown: Vec<RevisionId>,
}

/// One node's planned schema statements. The state statement is added by
/// [`Runner::statements`] when the step runs.
struct Step {
    revision: RevisionId,
    snapshot_checksum: String,
    statements: Vec<String>,
}

/// Plans and executes paths through the revision graph
pub struct Runner<'a> {
    db: &'a dyn Database,
    graph: &'a RevisionGraph,
    store: StateStore,
    options: RunnerOptions,
}

impl<'a> Runner<'a> {
    /// Create a runner
    pub fn new(
        db: &'a dyn Database,
        graph: &'a RevisionGraph,
        store: StateStore,
        options: RunnerOptions,
    ) -> Self {
        Self {
            db,
            graph,
            store,
            options,
        }
    }

    /// Apply every revision needed to reach `target`.
    pub async fn upgrade(&self, target: &Target) -> RunnerResult<RunReport> {
        let applied = self.applied_set().await?;
        let path = self.graph.upgrade_path(&applied, target)?;
        let steps = self.plan(&path, Direction::Upgrade)?;
        self.run(steps, Direction::Upgrade).await
    }

    /// Revert every applied revision that is not an ancestor of `target`.
    pub async fn downgrade(&self, target: &Target) -> RunnerResult<RunReport> {
        let applied = self.applied_set().await?;
        let path = self.graph.downgrade_path(&applied, target)?;
        let steps = self.plan(&path, Direction::Downgrade)?;
        self.run(steps, Direction::Downgrade).await
    }

    /// Compare the recorded state with the graph
    pub async fn status(&self) -> RunnerResult<StatusReport> {
        let applied = self.store.applied(self.db).await?;
        let set: HashSet<RevisionId> = applied.iter().map(|a| a.revision.clone()).collect();
        let unknown: Vec<RevisionId> = applied
            .iter()
            .filter(|a| !self.graph.contains(&a.revision))
            .map(|a| a.revision.clone())
            .collect();

        Ok(StatusReport {
            heads: self.graph.applied_heads(&set),
            pending: self.graph.pending(&set),
            unknown,
            applied,
        })
    }

    async fn applied_set(&self) -> RunnerResult<HashSet<RevisionId>> {
        let applied = self.store.applied_set(self.db).await?;
        let unknown: Vec<&RevisionId> = applied
            .iter()
            .filter(|rev| !self.graph.contains(rev))
            .collect();
        if !unknown.is_empty() {
            log::warn!(
                "Database records revision(s) not found in the versions directory: {}",
                join_revisions(unknown)
            );
        }
        Ok(applied)
    }

    /// Render every node on the path, failing before anything runs if any
    /// operation is infeasible for the backend.
    fn plan(&self, path: &[RevisionId], direction: Direction) -> RunnerResult<Vec<Step>> {
        let dialect = self.db.dialect();
        let mut problems: Vec<Infeasibility> = Vec::new();
        let mut steps = Vec::with_capacity(path.len());

        for rev in path {
            let node = self
                .graph
                .get(rev)
                .ok_or_else(|| CoreError::UnknownRevision {
                    revision: rev.to_string(),
                })?;
            let (ops, phase) = match direction {
                Direction::Upgrade => (&node.up, "up"),
                Direction::Downgrade => (&node.down, "down"),
            };

            let found = check_operations(ops, dialect, phase);
            if !found.is_empty() {
                problems.extend(found.into_iter().map(|p| Infeasibility {
                    operation: format!("{rev} {}", p.operation),
                    ..p
                }));
                continue;
            }

            steps.push(Step {
                revision: rev.clone(),
                snapshot_checksum: node.snapshot_checksum.clone(),
                statements: render_all(ops, dialect)?,
            });
        }

        into_result(problems, dialect)?;
        Ok(steps)
    }

    /// A step's schema statements followed by its state row change
    fn statements(&self, step: Step, direction: Direction) -> Vec<String> {
        let mut statements = step.statements;
        statements.push(match direction {
            Direction::Upgrade => self
                .store
                .record_up_sql(&step.revision, &step.snapshot_checksum),
            Direction::Downgrade => self.store.record_down_sql(&step.revision),
        });
        statements
    }

    async fn run(&self, steps: Vec<Step>, direction: Direction) -> RunnerResult<RunReport> {
        let mut report = RunReport {
            direction,
            applied: Vec::with_capacity(steps.len()),
            sql: Vec::new(),
        };

        if steps.is_empty() {
            log::debug!("Nothing to {}", direction.verb());
            return Ok(report);
        }

        if self.options.dry_run {
            if !self.store.exists(self.db).await? {
                report.sql.push(self.store.create_sql());
            }
            for step in steps {
                let revision = step.revision.clone();
                report.sql.extend(self.statements(step, direction));
                report.applied.push(revision);
            }
            return Ok(report);
        }

        self.store.ensure(self.db).await?;

        match self.options.transaction_mode {
            TransactionMode::PerRevision => {
                for step in steps {
                    let revision = step.revision.clone();
                    log::debug!("{} {}", direction, revision);
                    let statements = self.statements(step, direction);
                    if let Err(source) = self.db.transaction(&statements).await {
                        return Err(RunnerError::Failed {
                            direction,
                            revision,
                            source,
                            completed: report.applied,
                        });
                    }
                    log::info!("{} {}", direction.past_tense(), revision);
                    report.sql.extend(statements);
                    report.applied.push(revision);
                }
            }
            TransactionMode::All => self.run_single_transaction(steps, &mut report).await?,
        }

        Ok(report)
    }

    async fn run_single_transaction(
        &self,
        steps: Vec<Step>,
        report: &mut RunReport,
    ) -> RunnerResult<()> {
        let direction = report.direction;
        self.db
            .execute_batch("BEGIN TRANSACTION")
            .await
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

        for step in steps {
            let revision = step.revision.clone();
            log::debug!("{} {}", direction, revision);
            let statements = self.statements(step, direction);
            for sql in &statements {
                log::debug!("{sql}");
                if let Err(source) = self.db.execute_batch(sql).await {
                    let _ = self.db.execute_batch("ROLLBACK").await;
                    return Err(RunnerError::Failed {
                        direction,
                        revision,
                        source,
                        completed: Vec::new(),
                    });
                }
            }
            report.sql.extend(statements);
            report.applied.push(revision);
        }

        if let Err(e) = self.db.execute_batch("COMMIT").await {
            let _ = self.db.execute_batch("ROLLBACK").await;
            return Err(DbError::TransactionError(format!("COMMIT failed: {e}")).into());
        }
        for rev in &report.applied {
            log::info!("{} {}", direction.past_tense(), rev);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;

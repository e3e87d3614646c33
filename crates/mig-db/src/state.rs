//! Applied-revision state kept inside the target database.
//!
//! One row per applied revision in `<version_table>`. The runner is the only
//! writer; it appends the statements built here to each node's transaction
//! so the state and the schema change commit together. `seq` numbers rows in
//! the order they were recorded.

use crate::error::{DbError, DbResult};
use crate::traits::Database;
use mig_core::sql_utils::{escape_sql_string, validate_identifier};
use mig_core::RevisionId;
use std::collections::HashSet;

/// One recorded revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRevision {
    /// Revision id
    pub revision: RevisionId,
    /// When it was applied, as stored by the backend
    pub applied_at: String,
    /// Snapshot checksum the node carried when it was applied
    pub snapshot_checksum: String,
}

/// Reader and statement builder for the version table
#[derive(Debug, Clone)]
pub struct StateStore {
    table: String,
}

impl StateStore {
    /// Create a store over `table`, which must be a plain identifier.
    pub fn new(table: impl Into<String>) -> DbResult<Self> {
        let table = table.into();
        validate_identifier(&table)?;
        Ok(Self { table })
    }

    /// Version table name
    pub fn table(&self) -> &str {
        &self.table
    }

    /// `CREATE TABLE IF NOT EXISTS` for the version table
    pub fn create_sql(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             revision VARCHAR PRIMARY KEY, \
             seq INTEGER NOT NULL, \
             applied_at TIMESTAMP NOT NULL, \
             snapshot_checksum VARCHAR NOT NULL)",
            self.table
        )
    }

    /// Create the version table if it does not exist
    pub async fn ensure(&self, db: &dyn Database) -> DbResult<()> {
        db.execute_batch(&self.create_sql()).await
    }

    /// Whether the version table exists yet
    pub async fn exists(&self, db: &dyn Database) -> DbResult<bool> {
        db.relation_exists(&self.table).await
    }

    /// Every recorded revision, in the order it was recorded
    ///
    /// A missing version table means nothing is applied.
    pub async fn applied(&self, db: &dyn Database) -> DbResult<Vec<AppliedRevision>> {
        let sql = format!(
            "SELECT revision, CAST(applied_at AS VARCHAR), snapshot_checksum \
             FROM {} ORDER BY seq",
            self.table
        );
        let rows = match db.query_rows(&sql).await {
            Ok(rows) => rows,
            Err(DbError::TableNotFound(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        rows.into_iter().map(parse_row).collect()
    }

    /// Ids of every recorded revision
    pub async fn applied_set(&self, db: &dyn Database) -> DbResult<HashSet<RevisionId>> {
        Ok(self
            .applied(db)
            .await?
            .into_iter()
            .map(|a| a.revision)
            .collect())
    }

    /// Statement recording `revision` as applied now, after every row
    /// already in the table. Build it just before it runs.
    pub fn record_up_sql(&self, revision: &RevisionId, snapshot_checksum: &str) -> String {
        let applied_at = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.6f");
        format!(
            "INSERT INTO {t} (revision, seq, applied_at, snapshot_checksum) \
             SELECT '{}', COALESCE(MAX(seq), 0) + 1, '{}', '{}' FROM {t}",
            escape_sql_string(revision.as_str()),
            applied_at,
            escape_sql_string(snapshot_checksum),
            t = self.table,
        )
    }

    /// Statement removing `revision` from the state
    pub fn record_down_sql(&self, revision: &RevisionId) -> String {
        format!(
            "DELETE FROM {} WHERE revision = '{}'",
            self.table,
            escape_sql_string(revision.as_str())
        )
    }
}

fn parse_row(row: Vec<Option<String>>) -> DbResult<AppliedRevision> {
    let mut cols = row.into_iter();
    let mut next = |name: &str| {
        cols.next()
            .flatten()
            .ok_or_else(|| DbError::CorruptState(format!("missing {name}")))
    };
    let revision = next("revision")?;
    let applied_at = next("applied_at")?;
    let snapshot_checksum = next("snapshot_checksum")?;

    let revision = RevisionId::parse(&revision)
        .map_err(|e| DbError::CorruptState(format!("{revision}: {e}")))?;
    Ok(AppliedRevision {
        revision,
        applied_at,
        snapshot_checksum,
    })
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;

//! Migration nodes and their on-disk YAML format.
//!
//! A node file lives at `<versions_path>/<revision>_<slug>.yml` and records
//! the revisions it revises, its forward and inverse operations, and the
//! schema snapshot that results from applying it.

use crate::error::{io_err, CoreError, CoreResult};
use crate::operation::SchemaOperation;
use crate::revision::RevisionId;
use crate::schema::SchemaSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Maximum slug length in node file names.
const MAX_SLUG_LEN: usize = 40;

/// One revision in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationNode {
    /// Unique revision token
    pub revision: RevisionId,

    /// Parent revisions: empty for the root, two or more for a merge
    #[serde(
        default,
        serialize_with = "serialize_revises",
        deserialize_with = "deserialize_revises"
    )]
    pub revises: Vec<RevisionId>,

    /// Human-readable description
    pub message: String,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Forward operations
    #[serde(default)]
    pub up: Vec<SchemaOperation>,

    /// Inverse operations, run in order on downgrade
    #[serde(default)]
    pub down: Vec<SchemaOperation>,

    /// SHA-256 of `snapshot`
    pub snapshot_checksum: String,

    /// Schema after this revision is applied
    pub snapshot: SchemaSnapshot,

    /// File the node was loaded from
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RevisesRepr {
    One(RevisionId),
    Many(Vec<RevisionId>),
}

fn serialize_revises<S: Serializer>(revises: &[RevisionId], s: S) -> Result<S::Ok, S::Error> {
    match revises {
        [] => s.serialize_none(),
        [single] => single.serialize(s),
        many => many.serialize(s),
    }
}

fn deserialize_revises<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<RevisionId>, D::Error> {
    Ok(match Option::<RevisesRepr>::deserialize(d)? {
        None => Vec::new(),
        Some(RevisesRepr::One(id)) => vec![id],
        Some(RevisesRepr::Many(ids)) => ids,
    })
}

impl MigrationNode {
    /// Create a node with a fresh revision id and a computed snapshot checksum.
    pub fn new(
        revises: Vec<RevisionId>,
        message: impl Into<String>,
        up: Vec<SchemaOperation>,
        down: Vec<SchemaOperation>,
        snapshot: SchemaSnapshot,
    ) -> CoreResult<Self> {
        let snapshot_checksum = snapshot.checksum()?;
        Ok(Self {
            revision: RevisionId::generate(),
            revises,
            message: message.into(),
            created_at: Utc::now(),
            up,
            down,
            snapshot_checksum,
            snapshot,
            path: None,
        })
    }

    /// Whether this node has no parent
    pub fn is_root(&self) -> bool {
        self.revises.is_empty()
    }

    /// Whether this node joins two or more parents
    pub fn is_merge(&self) -> bool {
        self.revises.len() > 1
    }

    /// File name for this node: `<revision>_<slug>.yml`
    pub fn file_name(&self) -> String {
        let slug = slugify(&self.message);
        if slug.is_empty() {
            format!("{}.yml", self.revision)
        } else {
            format!("{}_{}.yml", self.revision, slug)
        }
    }

    /// Check the stored checksum against the snapshot content
    pub fn verify_checksum(&self) -> CoreResult<()> {
        let actual = self.snapshot.checksum()?;
        if actual != self.snapshot_checksum {
            return Err(CoreError::SnapshotChecksumMismatch {
                revision: self.revision.to_string(),
                expected: self.snapshot_checksum.clone(),
                actual,
            });
        }
        Ok(())
    }

    /// Replay the `up` operations on `parent` and return the resulting snapshot.
    pub fn replay(&self, parent: &SchemaSnapshot) -> CoreResult<SchemaSnapshot> {
        let mut snapshot = parent.clone();
        for op in &self.up {
            op.apply_to(&mut snapshot)?;
        }
        Ok(snapshot)
    }

    /// Load and verify a node file
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let mut node: MigrationNode =
            serde_yaml::from_str(&content).map_err(|e| CoreError::NodeParseError {
                path: path.display().to_string(),
                details: e.to_string(),
            })?;

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
        let file_revision = stem.split('_').next().unwrap_or("");
        if file_revision != node.revision.as_str() {
            return Err(CoreError::RevisionFileMismatch {
                path: path.display().to_string(),
                revision: node.revision.to_string(),
            });
        }

        node.verify_checksum()?;
        node.path = Some(path.to_path_buf());
        Ok(node)
    }

    /// Write the node into `dir`, returning the file path.
    ///
    /// Uses write-to-temp-then-rename so a crash never leaves a partial node
    /// file behind. Never overwrites an existing file.
    pub fn save(&self, dir: &Path) -> CoreResult<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

        let path = dir.join(self.file_name());
        if path.exists() {
            return Err(CoreError::DuplicateRevision {
                revision: self.revision.to_string(),
                path1: path.display().to_string(),
                path2: "(new node)".to_string(),
            });
        }

        let yaml = serde_yaml::to_string(self)?;
        let temp_path = path.with_extension(format!("yml.{}.tmp", std::process::id()));
        std::fs::write(&temp_path, yaml).map_err(|e| io_err(&temp_path, e))?;
        std::fs::rename(&temp_path, &path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            io_err(&path, e)
        })?;
        log::debug!("Wrote node {} to {}", self.revision, path.display());
        Ok(path)
    }
}

/// Lower-case the message and collapse runs of non-alphanumerics into `_`.
pub fn slugify(message: &str) -> String {
    let mut slug = String::with_capacity(message.len());
    let mut pending_sep = false;
    for c in message.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    slug.trim_end_matches('_').to_string()
}

/// Load every node file in `dir`, sorted by file name.
///
/// A missing directory yields no nodes.
pub fn discover_nodes(dir: &Path) -> CoreResult<Vec<MigrationNode>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let path = entry.map_err(|e| io_err(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "yml" || e == "yaml") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut nodes = Vec::with_capacity(paths.len());
    let mut seen: HashMap<RevisionId, PathBuf> = HashMap::new();
    for path in paths {
        let node = MigrationNode::load(&path)?;
        if let Some(previous) = seen.get(&node.revision) {
            return Err(CoreError::DuplicateRevision {
                revision: node.revision.to_string(),
                path1: previous.display().to_string(),
                path2: path.display().to_string(),
            });
        }
        seen.insert(node.revision.clone(), path);
        nodes.push(node);
    }
    log::debug!("Discovered {} node(s) in {}", nodes.len(), dir.display());
    Ok(nodes)
}

#[cfg(test)]
#[path = "node_test.rs"]
mod tests;

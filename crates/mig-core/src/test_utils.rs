//! Shared test utilities for mig-core

use crate::node::MigrationNode;
use crate::operation::{invert_all, SchemaOperation};
use crate::project::Project;
use crate::revision::RevisionId;
use std::path::Path;
use tempfile::TempDir;

/// Write `content` to `root/rel`, creating parent directories.
pub(crate) fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// A temp project with a DuckDB config and empty models/versions dirs.
pub(crate) fn temp_project() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "migrations.yml",
        "name: test_app\ndatabase:\n  type: duckdb\n  path: \":memory:\"\n",
    );
    std::fs::create_dir_all(dir.path().join("models")).unwrap();
    std::fs::create_dir_all(dir.path().join("migrations/versions")).unwrap();
    dir
}

/// Replace the declared model for `table` with the given column YAML lines.
pub(crate) fn write_model(root: &Path, table: &str, columns: &str) {
    write_file(
        root,
        &format!("models/{table}.yml"),
        &format!("table: {table}\ncolumns:\n{columns}"),
    );
}

/// Load the project rooted at `root`.
pub(crate) fn load(root: &Path) -> Project {
    Project::load(root).unwrap()
}

/// Save a node on top of `parent` that applies `ops`, bypassing the model diff.
pub(crate) fn save_branch(
    project: &Project,
    parent: &RevisionId,
    message: &str,
    ops: Vec<SchemaOperation>,
) -> RevisionId {
    let mut snapshot = project.graph.get(parent).unwrap().snapshot.clone();
    for op in &ops {
        op.apply_to(&mut snapshot).unwrap();
    }
    let down = invert_all(&ops);
    let node = MigrationNode::new(vec![parent.clone()], message, ops, down, snapshot).unwrap();
    node.save(&project.versions_dir()).unwrap();
    node.revision
}

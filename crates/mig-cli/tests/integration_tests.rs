//! Integration tests that drive the library crates over temp projects.

use mig_core::{
    check_project, generate, merge, new_revision, Dialect, GenerateOutcome, Project, Target,
};
use mig_db::{open_database, Database, Runner, RunnerOptions, StateStore};
use std::fs;
use std::path::Path;

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Project with a DuckDB file database and one `orders` model.
fn duckdb_project(transaction_mode: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        &dir.path().join("migrations.yml"),
        &format!(
            "name: shop\ntransaction_mode: {transaction_mode}\ndatabase:\n  type: duckdb\n  path: shop.duckdb\n"
        ),
    );
    write(
        &dir.path().join("models/orders.yml"),
        "table: orders\ncolumns:\n  - name: id\n    type: bigint\n    nullable: false\n  - name: amount\n    type: decimal(10,2)\n",
    );
    fs::create_dir_all(dir.path().join("migrations/versions")).unwrap();
    dir
}

fn generate_revision(project: &mut Project, message: &str) -> mig_core::RevisionId {
    let outcome = generate(project, message, Dialect::DuckDb, false).unwrap();
    let GenerateOutcome::Written(node) = outcome else {
        panic!("expected a written revision");
    };
    project.reload_graph().unwrap();
    node.revision.clone()
}

fn open(project: &Project) -> Box<dyn Database> {
    open_database(&project.config.database, &project.root).unwrap()
}

fn options(project: &Project) -> RunnerOptions {
    RunnerOptions {
        transaction_mode: project.config.transaction_mode,
        dry_run: false,
    }
}

#[tokio::test]
async fn test_duckdb_file_survives_reopen() {
    let dir = duckdb_project("per_revision");
    let mut project = Project::load(dir.path()).unwrap();
    let first = generate_revision(&mut project, "create orders");

    {
        let db = open(&project);
        let store = StateStore::new(project.config.version_table.clone()).unwrap();
        let runner = Runner::new(db.as_ref(), &project.graph, store, options(&project));
        let report = runner.upgrade(&Target::Heads).await.unwrap();
        assert_eq!(report.applied, vec![first.clone()]);
    }

    assert!(dir.path().join("shop.duckdb").is_file());

    let db = open(&project);
    assert!(db.relation_exists("orders").await.unwrap());
    let store = StateStore::new(project.config.version_table.clone()).unwrap();
    let applied = store.applied(db.as_ref()).await.unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].revision, first);
    let node = project.graph.get(&first).unwrap();
    assert_eq!(applied[0].snapshot_checksum, node.snapshot_checksum);
}

#[tokio::test]
async fn test_all_mode_upgrade_and_partial_downgrade() {
    let dir = duckdb_project("all");
    let mut project = Project::load(dir.path()).unwrap();
    let first = generate_revision(&mut project, "create orders");

    write(
        &dir.path().join("models/customers.yml"),
        "table: customers\ncolumns:\n  - name: id\n    type: bigint\n  - name: name\n    type: text\n",
    );
    let second = generate_revision(&mut project, "create customers");
    let third = new_revision(&project, "data fixups").unwrap().revision;
    project.reload_graph().unwrap();

    let db = open(&project);
    let store = StateStore::new(project.config.version_table.clone()).unwrap();
    let runner = Runner::new(db.as_ref(), &project.graph, store, options(&project));

    let target = project.graph.resolve("head").unwrap();
    assert_eq!(target, Target::Revision(third.clone()));
    let report = runner.upgrade(&target).await.unwrap();
    assert_eq!(report.applied, vec![first.clone(), second.clone(), third.clone()]);
    assert!(db.relation_exists("customers").await.unwrap());

    let prefix = &first.as_str()[..6];
    let back_to_first = project.graph.resolve(prefix).unwrap();
    let report = runner.downgrade(&back_to_first).await.unwrap();
    assert_eq!(report.applied, vec![third, second]);
    assert!(!db.relation_exists("customers").await.unwrap());
    assert!(db.relation_exists("orders").await.unwrap());

    let status = runner.status().await.unwrap();
    assert_eq!(status.heads, vec![first]);
    assert_eq!(status.pending.len(), 2);
}

#[tokio::test]
async fn test_merge_of_branches_with_distinct_tables() {
    let dir = duckdb_project("per_revision");
    let mut project = Project::load(dir.path()).unwrap();
    let root = generate_revision(&mut project, "create orders");

    // Branch one: a `customers` table.
    write(
        &dir.path().join("models/customers.yml"),
        "table: customers\ncolumns:\n  - name: id\n    type: bigint\n",
    );
    let left = generate_revision(&mut project, "create customers");

    // Branch two, written by hand against the root: a `products` table.
    let root_node = project.graph.get(&root).unwrap().clone();
    let products = mig_core::TableDef::new(
        "products",
        vec![mig_core::ColumnDef::new("sku", mig_core::ColumnType::Text)],
    );
    let mut snapshot = root_node.snapshot.clone();
    let up = vec![mig_core::SchemaOperation::CreateTable {
        table: products,
    }];
    for op in &up {
        op.apply_to(&mut snapshot).unwrap();
    }
    let down = mig_core::operation::invert_all(&up);
    let right_node =
        mig_core::MigrationNode::new(vec![root.clone()], "create products", up, down, snapshot)
            .unwrap();
    right_node.save(&project.versions_dir()).unwrap();
    let right = right_node.revision.clone();
    project.reload_graph().unwrap();

    let report = check_project(&project).unwrap();
    assert!(report.has_multiple_heads());
    assert!(!report.is_clean());

    let merged = merge(&project, &[], "join").unwrap();
    assert!(merged.revises.contains(&left) && merged.revises.contains(&right));
    assert!(merged.snapshot.tables.contains_key("products"));
    assert!(merged.snapshot.tables.contains_key("customers"));
    project.reload_graph().unwrap();

    // The declared models lack `products`, so only drift remains.
    let report = check_project(&project).unwrap();
    assert!(!report.has_multiple_heads());
    assert!(report.inconsistent.is_empty());
    assert_eq!(report.drift.len(), 1);

    let db = open(&project);
    let store = StateStore::new(project.config.version_table.clone()).unwrap();
    let runner = Runner::new(db.as_ref(), &project.graph, store, options(&project));
    let report = runner.upgrade(&Target::Heads).await.unwrap();
    assert_eq!(report.applied.len(), 4);
    assert_eq!(report.applied.first(), Some(&root));
    assert_eq!(report.applied.last(), Some(&merged.revision));
    assert!(db.relation_exists("products").await.unwrap());

    // Going back to one branch reverts the merge and the other branch only.
    let report = runner.downgrade(&Target::Revision(left.clone())).await.unwrap();
    assert_eq!(report.applied, vec![merged.revision.clone(), right]);
    assert!(!db.relation_exists("products").await.unwrap());
    assert!(db.relation_exists("customers").await.unwrap());
}

use super::*;
use crate::operation::SchemaOperation;
use crate::schema::{ColumnDef, ColumnType, TableDef};
use crate::test_utils::{load, save_branch, temp_project, write_model};

const USERS_V1: &str = "  - { name: id, type: integer, primary_key: true }\n  - { name: name, type: text }\n";
const USERS_V2: &str = "  - { name: id, type: integer, primary_key: true }\n  - { name: name, type: text }\n  - { name: email, type: text }\n";

fn generated(outcome: GenerateOutcome) -> MigrationNode {
    match outcome {
        GenerateOutcome::Written(node) => *node,
        GenerateOutcome::NoChanges => panic!("expected a node to be written"),
    }
}

#[test]
fn test_generate_initial_revision() {
    let dir = temp_project();
    write_model(dir.path(), "users", USERS_V1);
    let project = load(dir.path());

    let node = generated(generate(&project, "create users", Dialect::DuckDb, false).unwrap());
    assert!(node.is_root());
    assert_eq!(node.up.len(), 1);
    assert_eq!(node.up[0].kind(), "create_table");
    assert_eq!(node.down[0].kind(), "drop_table");
    assert!(node.snapshot.table("users").is_some());

    let path = node.path.clone().unwrap();
    assert!(path.exists());
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .ends_with("_create_users.yml"));

    let reloaded = load(dir.path());
    assert_eq!(reloaded.graph.single_head().unwrap(), Some(node.revision));
}

#[test]
fn test_generate_chains_on_head() {
    let dir = temp_project();
    write_model(dir.path(), "users", USERS_V1);
    let first = generated(generate(&load(dir.path()), "first", Dialect::DuckDb, false).unwrap());

    write_model(dir.path(), "users", USERS_V2);
    let second = generated(
        generate(&load(dir.path()), "add email", Dialect::DuckDb, false).unwrap(),
    );

    assert_eq!(second.revises, vec![first.revision.clone()]);
    assert_eq!(
        second.up.iter().map(|o| o.to_string()).collect::<Vec<_>>(),
        vec!["add_column users.email"]
    );
    assert_eq!(second.down[0].kind(), "drop_column");
    assert_eq!(load(dir.path()).graph.len(), 2);
}

#[test]
fn test_generate_no_changes_writes_nothing() {
    let dir = temp_project();
    write_model(dir.path(), "users", USERS_V1);
    generated(generate(&load(dir.path()), "first", Dialect::DuckDb, false).unwrap());

    let outcome = generate(&load(dir.path()), "again", Dialect::DuckDb, false).unwrap();
    assert!(matches!(outcome, GenerateOutcome::NoChanges));
    assert_eq!(load(dir.path()).graph.len(), 1);

    let empty = generated(generate(&load(dir.path()), "again", Dialect::DuckDb, true).unwrap());
    assert!(empty.up.is_empty());
}

#[test]
fn test_generate_infeasible_writes_nothing() {
    let dir = temp_project();
    write_model(dir.path(), "users", USERS_V1);
    generated(generate(&load(dir.path()), "first", Dialect::Sqlite, false).unwrap());

    write_model(
        dir.path(),
        "users",
        "  - { name: id, type: bigint, primary_key: true }\n  - { name: name, type: text }\n",
    );
    let err = generate(&load(dir.path()), "widen id", Dialect::Sqlite, false).unwrap_err();
    assert!(matches!(err, CoreError::InfeasibleOperations { .. }));
    assert_eq!(load(dir.path()).graph.len(), 1);
}

#[test]
fn test_generate_refuses_multiple_heads() {
    let dir = temp_project();
    write_model(dir.path(), "users", USERS_V1);
    let project = load(dir.path());
    let root = generated(generate(&project, "root", Dialect::DuckDb, false).unwrap());

    let project = load(dir.path());
    new_revision(&project, "branch a").unwrap();
    new_revision(&project, "branch b").unwrap();

    let project = load(dir.path());
    assert_eq!(project.graph.heads().len(), 2);
    assert!(project.graph.children(&root.revision).len() == 2);
    let err = generate(&project, "more", Dialect::DuckDb, false).unwrap_err();
    assert!(matches!(err, CoreError::MultipleHeads { .. }));
}

#[test]
fn test_new_revision_copies_head_snapshot() {
    let dir = temp_project();
    write_model(dir.path(), "users", USERS_V1);
    let root = generated(generate(&load(dir.path()), "root", Dialect::DuckDb, false).unwrap());

    let node = new_revision(&load(dir.path()), "data fix").unwrap();
    assert_eq!(node.revises, vec![root.revision]);
    assert!(node.up.is_empty() && node.down.is_empty());
    assert_eq!(node.snapshot, root.snapshot);
}

#[test]
fn test_merge_joins_heads() {
    let dir = temp_project();
    write_model(dir.path(), "users", USERS_V1);
    generated(generate(&load(dir.path()), "root", Dialect::DuckDb, false).unwrap());
    let project = load(dir.path());
    let a = new_revision(&project, "branch a").unwrap();
    let b = new_revision(&project, "branch b").unwrap();

    let merged = merge(&load(dir.path()), &[], "merge branches").unwrap();
    let mut expected = vec![a.revision, b.revision];
    expected.sort();
    assert_eq!(merged.revises, expected);
    assert!(merged.is_merge());
    assert!(merged.up.is_empty());
    assert!(merged.snapshot.table("users").is_some());

    let project = load(dir.path());
    assert_eq!(project.graph.single_head().unwrap(), Some(merged.revision));
}

#[test]
fn test_merge_single_head_is_nothing_to_merge() {
    let dir = temp_project();
    write_model(dir.path(), "users", USERS_V1);
    generated(generate(&load(dir.path()), "root", Dialect::DuckDb, false).unwrap());
    let err = merge(&load(dir.path()), &[], "merge").unwrap_err();
    assert!(matches!(err, CoreError::NothingToMerge { .. }));
}

#[test]
fn test_merge_rejects_ancestor() {
    let dir = temp_project();
    write_model(dir.path(), "users", USERS_V1);
    let root = generated(generate(&load(dir.path()), "root", Dialect::DuckDb, false).unwrap());
    let child = new_revision(&load(dir.path()), "child").unwrap();
    let err = merge(&load(dir.path()), &[root.revision, child.revision], "merge").unwrap_err();
    assert!(err.to_string().contains("ancestor"));
}

#[test]
fn test_merge_conflicting_tables() {
    let dir = temp_project();
    write_model(dir.path(), "users", USERS_V1);
    generated(generate(&load(dir.path()), "root", Dialect::DuckDb, false).unwrap());

    // Two branches that change the same table differently.
    let project = load(dir.path());
    let head_snapshot = project.head_snapshot().unwrap();
    let head = project.graph.single_head().unwrap().unwrap();

    for (message, extra) in [("a", "x"), ("b", "y")] {
        let mut snapshot = head_snapshot.clone();
        let op = crate::operation::SchemaOperation::AddColumn {
            table: "users".to_string(),
            column: crate::schema::ColumnDef::new(extra, crate::schema::ColumnType::Text),
        };
        op.apply_to(&mut snapshot).unwrap();
        let down = invert_all(std::slice::from_ref(&op));
        let node =
            MigrationNode::new(vec![head.clone()], message, vec![op], down, snapshot).unwrap();
        node.save(&project.versions_dir()).unwrap();
    }

    let err = merge(&load(dir.path()), &[], "merge").unwrap_err();
    assert!(matches!(err, CoreError::MergeConflict { ref table, .. } if table == "users"));
}

fn posts_table() -> SchemaOperation {
    SchemaOperation::CreateTable {
        table: TableDef::new(
            "posts",
            vec![ColumnDef::new("id", ColumnType::Integer)],
        ),
    }
}

/// Root revision with `users` and `teams`; returns its id.
fn users_and_teams(root: &std::path::Path) -> RevisionId {
    write_model(root, "users", USERS_V1);
    write_model(root, "teams", "  - { name: id, type: integer }\n");
    generated(generate(&load(root), "root", Dialect::DuckDb, false).unwrap()).revision
}

#[test]
fn test_merge_keeps_one_sided_column_add() {
    let dir = temp_project();
    let base = users_and_teams(dir.path());
    let project = load(dir.path());
    save_branch(
        &project,
        &base,
        "email",
        vec![SchemaOperation::AddColumn {
            table: "users".to_string(),
            column: ColumnDef::new("email", ColumnType::Text),
        }],
    );
    save_branch(&project, &base, "posts", vec![posts_table()]);

    let node = merge(&load(dir.path()), &[], "merge").unwrap();
    let users = node.snapshot.table("users").unwrap();
    assert!(users.column("email").is_some());
    assert!(node.snapshot.table("posts").is_some());
    assert!(node.snapshot.table("teams").is_some());
}

#[test]
fn test_merge_keeps_one_sided_drop() {
    let dir = temp_project();
    let base = users_and_teams(dir.path());
    let project = load(dir.path());
    let teams = project.graph.get(&base).unwrap().snapshot.table("teams").unwrap().clone();
    save_branch(
        &project,
        &base,
        "drop teams",
        vec![SchemaOperation::DropTable { table: teams }],
    );
    save_branch(&project, &base, "posts", vec![posts_table()]);

    let node = merge(&load(dir.path()), &[], "merge").unwrap();
    assert!(node.snapshot.table("teams").is_none());
    assert!(node.snapshot.table("posts").is_some());
    assert!(node.snapshot.table("users").is_some());
}

#[test]
fn test_merge_accepts_identical_changes_on_both_sides() {
    let dir = temp_project();
    let base = users_and_teams(dir.path());
    let project = load(dir.path());
    save_branch(&project, &base, "posts a", vec![posts_table()]);
    save_branch(&project, &base, "posts b", vec![posts_table()]);

    let node = merge(&load(dir.path()), &[], "merge").unwrap();
    assert!(node.snapshot.table("posts").is_some());
}

#[test]
fn test_merge_conflicts_on_drop_against_alter() {
    let dir = temp_project();
    let base = users_and_teams(dir.path());
    let project = load(dir.path());
    let teams = project.graph.get(&base).unwrap().snapshot.table("teams").unwrap().clone();
    save_branch(
        &project,
        &base,
        "drop teams",
        vec![SchemaOperation::DropTable { table: teams }],
    );
    save_branch(
        &project,
        &base,
        "team name",
        vec![SchemaOperation::AddColumn {
            table: "teams".to_string(),
            column: ColumnDef::new("name", ColumnType::Text),
        }],
    );

    let err = merge(&load(dir.path()), &[], "merge").unwrap_err();
    assert!(matches!(err, CoreError::MergeConflict { ref table, .. } if table == "teams"));
}

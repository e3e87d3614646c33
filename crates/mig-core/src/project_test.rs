use super::*;
use crate::test_utils::{load, temp_project, write_file, write_model};

#[test]
fn test_load_empty_project() {
    let dir = temp_project();
    let project = load(dir.path());
    assert_eq!(project.config.name, "test_app");
    assert!(project.graph.is_empty());
    assert!(project.head_snapshot().unwrap().is_empty());
    assert!(project.versions_dir().ends_with("migrations/versions"));
}

#[test]
fn test_missing_project_dir() {
    let dir = tempfile::tempdir().unwrap();
    let err = Project::load(&dir.path().join("nope")).unwrap_err();
    assert!(matches!(err, CoreError::ProjectNotFound { .. }));
}

#[test]
fn test_missing_config() {
    let dir = tempfile::tempdir().unwrap();
    let err = Project::load(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_explicit_config_path() {
    let dir = temp_project();
    write_file(
        dir.path(),
        "conf/alt.yml",
        "name: alt\nversions_path: history\n",
    );
    let project =
        Project::load_with_config(dir.path(), Some(&dir.path().join("conf/alt.yml"))).unwrap();
    assert_eq!(project.config.name, "alt");
    assert!(project.versions_dir().ends_with("history"));
}

#[test]
fn test_declared_schema_reads_models_dir() {
    let dir = temp_project();
    write_model(
        dir.path(),
        "users",
        "  - { name: id, type: integer, primary_key: true }\n",
    );
    let project = load(dir.path());
    assert!(project.declared_schema().unwrap().table("users").is_some());
}

#[test]
fn test_broken_node_file_fails_load() {
    let dir = temp_project();
    write_file(
        dir.path(),
        "migrations/versions/abcd1234_bad.yml",
        "revision: abcd1234\nnot_a_field: true\n",
    );
    let err = Project::load(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::NodeParseError { .. }));
}

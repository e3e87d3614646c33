use super::*;

#[tokio::test]
async fn test_in_memory() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), DbType::DuckDb);
    assert_eq!(db.dialect(), mig_core::Dialect::DuckDb);
}

#[tokio::test]
async fn test_new_with_memory_path() {
    let db = DuckDbBackend::new(":memory:").unwrap();
    db.execute_batch("CREATE TABLE t (id INTEGER)").await.unwrap();
    assert!(db.relation_exists("t").await.unwrap());
}

#[tokio::test]
async fn test_from_path_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.duckdb");
    {
        let db = DuckDbBackend::from_path(&path).unwrap();
        db.execute_batch("CREATE TABLE kept (id INTEGER)").await.unwrap();
    }
    let db = DuckDbBackend::from_path(&path).unwrap();
    assert!(db.relation_exists("kept").await.unwrap());
}

#[tokio::test]
async fn test_relation_exists() {
    let db = DuckDbBackend::in_memory().unwrap();
    assert!(!db.relation_exists("missing").await.unwrap());
    db.execute_batch("CREATE VIEW v AS SELECT 1 AS x").await.unwrap();
    assert!(db.relation_exists("v").await.unwrap());
    assert!(db.relation_exists("main.v").await.unwrap());
}

#[tokio::test]
async fn test_query_rows() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.execute_batch(
        "CREATE TABLE people (name VARCHAR, nick VARCHAR);
         INSERT INTO people VALUES ('ada', NULL), ('grace', 'amazing');",
    )
    .await
    .unwrap();

    let rows = db
        .query_rows("SELECT name, nick FROM people ORDER BY name")
        .await
        .unwrap();
    assert_eq!(
        rows,
        vec![
            vec![Some("ada".to_string()), None],
            vec![Some("grace".to_string()), Some("amazing".to_string())],
        ]
    );
}

#[tokio::test]
async fn test_transaction_commits() {
    let db = DuckDbBackend::in_memory().unwrap();
    db.transaction(&[
        "CREATE TABLE t (id INTEGER)".to_string(),
        "INSERT INTO t VALUES (1), (2)".to_string(),
    ])
    .await
    .unwrap();

    let rows = db
        .query_rows("SELECT CAST(COUNT(*) AS VARCHAR) FROM t")
        .await
        .unwrap();
    assert_eq!(rows, vec![vec![Some("2".to_string())]]);
}

#[tokio::test]
async fn test_transaction_rolls_back_on_failure() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db
        .transaction(&[
            "CREATE TABLE t (id INTEGER)".to_string(),
            "INSERT INTO missing VALUES (1)".to_string(),
        ])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("missing"));
    assert!(!db.relation_exists("t").await.unwrap());

    // Connection is usable after the rollback.
    db.execute_batch("CREATE TABLE t (id INTEGER)").await.unwrap();
}

#[tokio::test]
async fn test_execute_error_includes_sql() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db.execute("SELEC 1").await.unwrap_err();
    assert!(matches!(err, DbError::ExecutionError(_)));
    assert!(err.to_string().contains("SELEC 1"));
}

#[tokio::test]
async fn test_query_missing_table_is_table_not_found() {
    let db = DuckDbBackend::in_memory().unwrap();
    let err = db.query_rows("SELECT * FROM no_such_table").await.unwrap_err();
    assert!(matches!(err, DbError::TableNotFound(_)), "{err}");
}

use super::*;
use crate::session::with_transaction;

fn count(session: &DuckDbSession, sql: &str) -> i64 {
    let rows = session.query_rows(sql, &[]).unwrap();
    rows[0][0].as_deref().unwrap().parse().unwrap()
}

#[test]
fn test_in_memory() {
    let session = DuckDbSession::new(":memory:").unwrap();
    assert_eq!(session.db_type(), "duckdb");
}

#[test]
fn test_from_path_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("deeper").join("app.duckdb");
    let _session = DuckDbSession::from_path(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_execute_batch_and_params() {
    let session = DuckDbSession::in_memory().unwrap();
    session
        .execute_batch("CREATE TABLE t (id INTEGER, name VARCHAR);")
        .unwrap();
    let affected = session
        .execute("INSERT INTO t VALUES (CAST(? AS INTEGER), ?)", &["7", "seven"])
        .unwrap();
    assert_eq!(affected, 1);
    assert_eq!(count(&session, "SELECT COUNT(*) FROM t"), 1);
}

#[test]
fn test_query_rows_coerces_values() {
    let session = DuckDbSession::in_memory().unwrap();
    let rows = session
        .query_rows("SELECT 'a' AS s, 42 AS n, NULL AS missing", &[])
        .unwrap();
    assert_eq!(
        rows,
        vec![vec![
            Some("a".to_string()),
            Some("42".to_string()),
            None,
        ]]
    );
}

#[test]
fn test_query_rows_with_params() {
    let session = DuckDbSession::in_memory().unwrap();
    session
        .execute_batch("CREATE TABLE t (name VARCHAR); INSERT INTO t VALUES ('x'), ('y');")
        .unwrap();
    let rows = session
        .query_rows("SELECT name FROM t WHERE name = ?", &["y"])
        .unwrap();
    assert_eq!(rows, vec![vec![Some("y".to_string())]]);
}

#[test]
fn test_execute_error_is_reported() {
    let session = DuckDbSession::in_memory().unwrap();
    let err = session.execute_batch("SELEC 1").unwrap_err();
    assert!(matches!(err, DbError::ExecutionError(_)));
}

#[test]
fn test_rollback_discards_ddl() {
    let session = DuckDbSession::in_memory().unwrap();
    session.begin().unwrap();
    session.execute_batch("CREATE TABLE gone (id INTEGER)").unwrap();
    session.rollback().unwrap();
    assert_eq!(
        count(
            &session,
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'gone'"
        ),
        0
    );
}

#[test]
fn test_with_transaction_commits_on_success() {
    let session = DuckDbSession::in_memory().unwrap();
    with_transaction(&session, |s| s.execute_batch("CREATE TABLE kept (id INTEGER)")).unwrap();
    assert_eq!(
        count(
            &session,
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'kept'"
        ),
        1
    );
}

#[test]
fn test_with_transaction_rolls_back_on_error() {
    let session = DuckDbSession::in_memory().unwrap();
    let result = with_transaction(&session, |s| {
        s.execute_batch("CREATE TABLE partial (id INTEGER)")?;
        s.execute_batch("NOT VALID SQL")
    });
    assert!(result.is_err());
    assert_eq!(
        count(
            &session,
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'partial'"
        ),
        0
    );
}

#[test]
fn test_duckdb_error_converts_to_execution_error() {
    let session = DuckDbSession::in_memory().unwrap();
    let err = session
        .execute_batch("SELECT * FROM no_such_table")
        .unwrap_err();
    match err {
        DbError::ExecutionError(message) => assert!(message.contains("no_such_table")),
        other => panic!("Expected ExecutionError, got {other:?}"),
    }
}

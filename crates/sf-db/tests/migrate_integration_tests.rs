//! End-to-end migration runs against DuckDB files in scratch project
//! directories, reopening the database between runs.

use sf_core::{Config, MigrationSource};
use sf_db::{
    provision, AppliedStore, DuckDbSession, MigrateError, Migrator, Session, SqlAppliedStore,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// ── Helpers ────────────────────────────────────────────────────────────

const INIT: &str = "\
-- +migrate Up
CREATE TABLE t (id INTEGER PRIMARY KEY);

-- +migrate Down
DROP TABLE t;
";

const ADD_COL: &str = "\
-- +migrate Up
ALTER TABLE t ADD COLUMN name VARCHAR;
";

const BAD: &str = "\
-- +migrate Up
ALTER TABLE missing_table ADD COLUMN name VARCHAR;
";

fn test_config() -> Config {
    serde_yaml::from_str(
        r#"
name: integration_test_project
database:
  path: db/app.duckdb
migrations:
  dir: migrations
"#,
    )
    .unwrap()
}

fn write_migration(root: &Path, rel: &str, content: &str) {
    let path = root.join("migrations").join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn applied_ids(session: &DuckDbSession) -> Vec<String> {
    SqlAppliedStore::new(session, "schema_migrations")
        .unwrap()
        .applied_records()
        .unwrap()
        .into_iter()
        .map(|r| r.id.to_string())
        .collect()
}

fn column_count(session: &DuckDbSession, table: &str) -> i64 {
    let rows = session
        .query_rows(
            "SELECT COUNT(*) FROM information_schema.columns WHERE table_name = ?",
            &[table],
        )
        .unwrap();
    rows[0][0].as_deref().unwrap().parse().unwrap()
}

// ── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn test_second_run_applies_nothing() {
    let project = TempDir::new().unwrap();
    write_migration(project.path(), "001_init.sql", INIT);
    write_migration(project.path(), "002_add_col.sql", ADD_COL);
    let config = test_config();

    let session = provision(&config, project.path()).unwrap();
    assert_eq!(applied_ids(&session), vec!["001_init.sql", "002_add_col.sql"]);
    assert_eq!(column_count(&session, "t"), 2);
    let first = SqlAppliedStore::new(&session, "schema_migrations")
        .unwrap()
        .applied_records()
        .unwrap();
    drop(session);

    let session = provision(&config, project.path()).unwrap();
    let second = SqlAppliedStore::new(&session, "schema_migrations")
        .unwrap()
        .applied_records()
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(column_count(&session, "t"), 2);

    let report = sf_db::migrate(&session, &config, project.path()).unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(report.already_applied, 2);
}

#[test]
fn test_failed_migration_is_retried_after_fix() {
    let project = TempDir::new().unwrap();
    write_migration(project.path(), "001_init.sql", INIT);
    write_migration(project.path(), "002_bad.sql", BAD);
    let config = test_config();

    let err = provision(&config, project.path()).unwrap_err();
    match &err {
        MigrateError::Apply { id, .. } => assert_eq!(id, "002_bad.sql"),
        other => panic!("Expected Apply error, got {other:?}"),
    }

    let db_path = config.database_path_absolute(project.path());
    {
        let session = DuckDbSession::new(&db_path).unwrap();
        assert_eq!(applied_ids(&session), vec!["001_init.sql"]);
    }

    write_migration(project.path(), "002_bad.sql", ADD_COL);
    let session = provision(&config, project.path()).unwrap();
    assert_eq!(applied_ids(&session), vec!["001_init.sql", "002_bad.sql"]);
    assert_eq!(column_count(&session, "t"), 2);
}

#[test]
fn test_nested_migrations_apply_in_id_order() {
    let project = TempDir::new().unwrap();
    // Directory layout does not affect order; 10 sorts after 9 numerically
    write_migration(project.path(), "a/deep/10_third.sql", ADD_COL);
    write_migration(project.path(), "z/9_second.sql", "-- +migrate Up\nINSERT INTO t (id) VALUES (1);\n");
    write_migration(project.path(), "1_first.sql", INIT);

    let session = provision(&test_config(), project.path()).unwrap();
    assert_eq!(
        applied_ids(&session),
        vec!["1_first.sql", "9_second.sql", "10_third.sql"]
    );
}

#[test]
fn test_duplicate_ids_in_different_directories_fail_before_any_statement() {
    let project = TempDir::new().unwrap();
    write_migration(project.path(), "001_init.sql", INIT);
    write_migration(project.path(), "nested/001_init.sql", INIT);
    let config = test_config();

    let err = provision(&config, project.path()).unwrap_err();
    assert!(matches!(
        err,
        MigrateError::Discovery(sf_core::CoreError::DuplicateMigrationId { .. })
    ));

    let session = DuckDbSession::new(&config.database_path_absolute(project.path())).unwrap();
    let store = SqlAppliedStore::new(&session, "schema_migrations").unwrap();
    assert!(!store.is_bootstrapped().unwrap());
}

#[test]
fn test_status_after_partial_run() {
    let project = TempDir::new().unwrap();
    write_migration(project.path(), "001_init.sql", INIT);
    write_migration(project.path(), "002_add_col.sql", ADD_COL);
    let config = test_config();

    let session = DuckDbSession::new(&config.database_path_absolute(project.path())).unwrap();
    let migrations = MigrationSource::new(config.migrations_dir_absolute(project.path()))
        .find_migrations()
        .unwrap();
    let store = SqlAppliedStore::new(&session, "schema_migrations").unwrap();
    let migrator = Migrator::new(sf_db::MigrateOptions::default().with_limit(Some(1)));
    migrator.run(&session, &store, &migrations).unwrap();

    let status = Migrator::default().status(&store, &migrations).unwrap();
    assert_eq!(status.entries.len(), 2);
    assert!(status.entries[0].is_applied());
    assert!(!status.entries[1].is_applied());
    assert_eq!(status.pending_count(), 1);
    assert_eq!(session.db_type(), "duckdb");
}

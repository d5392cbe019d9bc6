//! Loads a project config from disk and discovers its migrations through the
//! paths the config resolves.

use sf_core::test_utils::MemoryFs;
use sf_core::{Config, CoreError, MigrationSource, OutOfOrderPolicy};
use std::fs;
use tempfile::TempDir;

fn write(root: &std::path::Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_config_drives_discovery() {
    let project = TempDir::new().unwrap();
    write(
        project.path(),
        "schemaflow.yml",
        r#"
name: shop
migrations:
  dir: db/migrate
  suffix: .up.sql
  out_of_order: reject
"#,
    );
    write(
        project.path(),
        "db/migrate/2024/002_orders.up.sql",
        "-- +migrate Up\nCREATE TABLE orders (id INTEGER);\n",
    );
    write(
        project.path(),
        "db/migrate/001_users.up.sql",
        "-- +migrate Up\n-- +migrate StatementBegin\nCREATE TABLE users (id INTEGER);\n-- +migrate StatementEnd\n",
    );
    write(project.path(), "db/migrate/README.md", "docs");

    let config = Config::load_from_dir(project.path()).unwrap();
    assert_eq!(config.migrations.out_of_order, OutOfOrderPolicy::Reject);

    let migrations = MigrationSource::new(config.migrations_dir_absolute(project.path()))
        .suffix(config.migrations.suffix.as_str())
        .find_migrations()
        .unwrap();
    let ids: Vec<&str> = migrations.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["001_users.up.sql", "002_orders.up.sql"]);
    assert!(migrations.iter().all(|m| m.up_statements.len() == 1));
    assert!(migrations[1]
        .path
        .as_ref()
        .unwrap()
        .ends_with("2024/002_orders.up.sql"));
}

#[test]
fn test_missing_config_is_reported() {
    let project = TempDir::new().unwrap();
    let err = Config::load_from_dir(project.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_memory_fs_matches_os_discovery() {
    let fs = MemoryFs::new()
        .file("/m/10_c.sql", "-- +migrate Up\nSELECT 3;\n")
        .file("/m/x/2_b.sql", "-- +migrate Up\nSELECT 2;\n")
        .file("/m/1_a.sql", "-- +migrate Up\nSELECT 1;\n");
    let migrations = MigrationSource::with_fs(fs, "/m").find_migrations().unwrap();
    let ids: Vec<&str> = migrations.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["1_a.sql", "2_b.sql", "10_c.sql"]);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_followed() {
    let project = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    write(
        outside.path(),
        "999_outside.sql",
        "-- +migrate Up\nSELECT 1;\n",
    );
    write(
        project.path(),
        "migrations/001_init.sql",
        "-- +migrate Up\nSELECT 1;\n",
    );
    std::os::unix::fs::symlink(outside.path(), project.path().join("migrations/linked")).unwrap();
    std::os::unix::fs::symlink(
        outside.path().join("999_outside.sql"),
        project.path().join("migrations/998_link.sql"),
    )
    .unwrap();

    let migrations = MigrationSource::new(project.path().join("migrations"))
        .find_migrations()
        .unwrap();
    let ids: Vec<&str> = migrations.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["001_init.sql"]);
}

#[cfg(unix)]
#[test]
fn test_non_utf8_entry_fails_discovery() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let project = TempDir::new().unwrap();
    let root = project.path().join("migrations");
    write(&root, "001_init.sql", "-- +migrate Up\nSELECT 1;\n");
    let odd = root.join(OsStr::from_bytes(b"sub\xff"));
    if fs::create_dir(&odd).is_err() {
        // Filesystems that enforce UTF-8 names cannot hold such an entry
        return;
    }
    fs::write(odd.join("002_add.sql"), "-- +migrate Up\nSELECT 2;\n").unwrap();

    let err = MigrationSource::new(&root).find_migrations().unwrap_err();
    match err {
        CoreError::MigrationDirUnreadable { path, source } => {
            assert_eq!(path, root.display().to_string());
            assert_eq!(source.kind(), std::io::ErrorKind::InvalidData);
        }
        other => panic!("Expected MigrationDirUnreadable, got {other:?}"),
    }
}

//! Startup entry point: open the project database and bring it up to date.

use crate::duckdb::DuckDbSession;
use crate::error::{MigrateError, MigrateResult};
use crate::executor::{MigrateOptions, MigrationReport, Migrator};
use crate::session::Session;
use crate::store::SqlAppliedStore;
use sf_core::{Config, MigrationSource};
use std::path::Path;

/// Open the configured database and, when `migrations.enabled` is set, apply
/// every pending migration.
///
/// Failures are returned to the caller, never turned into a process exit.
pub fn provision(config: &Config, project_root: &Path) -> MigrateResult<DuckDbSession> {
    let path = config.database_path_absolute(project_root);
    let session =
        DuckDbSession::new(&path).map_err(|source| MigrateError::Connection { path, source })?;

    if config.migrations.enabled {
        migrate(&session, config, project_root)?;
    } else {
        log::info!("Migrations disabled for project '{}'; skipping", config.name);
    }
    Ok(session)
}

/// Discover the project's migrations and apply the pending ones on `session`.
pub fn migrate<S: Session + ?Sized>(
    session: &S,
    config: &Config,
    project_root: &Path,
) -> MigrateResult<MigrationReport> {
    migrate_with_options(
        session,
        config,
        project_root,
        MigrateOptions::from_config(&config.migrations),
    )
}

/// Like [`migrate`], with explicit run options (e.g. a limit).
pub fn migrate_with_options<S: Session + ?Sized>(
    session: &S,
    config: &Config,
    project_root: &Path,
    options: MigrateOptions,
) -> MigrateResult<MigrationReport> {
    let migrations = MigrationSource::new(config.migrations_dir_absolute(project_root))
        .suffix(config.migrations.suffix.as_str())
        .find_migrations()?;
    let store =
        SqlAppliedStore::new(session, &config.migrations.table).map_err(MigrateError::Store)?;
    Migrator::new(options).run(session, &store, &migrations)
}

#[cfg(test)]
#[path = "provision_test.rs"]
mod tests;

//! Migration executor.
//!
//! [`Migrator::run`] diffs the discovered migrations against the
//! applied-state store and applies the pending ones strictly in ascending id
//! order. Each migration runs in its own transaction and is recorded only
//! after that transaction commits. The first failure stops the run: earlier
//! migrations stay applied and recorded, later ones are never attempted.
//!
//! Concurrent runners against the same database are not coordinated; callers
//! must ensure a single runner per database.

use crate::error::{ApplyStep, DbError, MigrateError, MigrateResult};
use crate::session::Session;
use crate::store::{AppliedRecord, AppliedStore};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use serde::Serialize;
use sf_core::config::MigrationsConfig;
use sf_core::{CoreError, Migration, MigrationId, OutOfOrderPolicy};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

/// Knobs for a migration run.
#[derive(Debug, Clone, Default)]
pub struct MigrateOptions {
    /// Policy for pending migrations that sort before the newest applied one
    pub out_of_order: OutOfOrderPolicy,

    /// Skip (with a warning) applied ids that have no migration file
    pub ignore_unknown: bool,

    /// Apply at most this many migrations
    pub limit: Option<usize>,
}

impl MigrateOptions {
    /// Options taken from the `migrations` section of the project config.
    pub fn from_config(config: &MigrationsConfig) -> Self {
        Self {
            out_of_order: config.out_of_order,
            ignore_unknown: config.ignore_unknown,
            limit: None,
        }
    }

    /// Cap the number of migrations applied in one run.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

/// What a run would do, computed without touching the database.
#[derive(Debug)]
pub struct MigrationPlan<'m> {
    /// Migrations to apply, in order
    pub pending: Vec<&'m Migration>,

    /// Pending ids that sort before the newest applied id
    pub out_of_order: Vec<MigrationId>,

    /// Applied ids with no discovered migration (only when ignored)
    pub unknown: Vec<MigrationId>,

    /// Number of discovered migrations already applied
    pub already_applied: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Ids applied by this run, in order
    pub applied: Vec<MigrationId>,

    /// Number of migrations that were already applied before the run
    pub already_applied: usize,
}

/// Applied state of a single discovered migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    pub id: MigrationId,
    pub applied_at: Option<NaiveDateTime>,
    pub path: Option<PathBuf>,
}

impl StatusEntry {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// Applied state of every discovered migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStatus {
    /// One entry per discovered migration, in order
    pub entries: Vec<StatusEntry>,

    /// Records whose id matches no discovered migration
    pub unknown: Vec<AppliedRecord>,
}

impl MigrationStatus {
    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_applied()).count()
    }
}

/// Applies pending migrations.
#[derive(Debug, Clone, Default)]
pub struct Migrator {
    options: MigrateOptions,
}

impl Migrator {
    pub fn new(options: MigrateOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MigrateOptions {
        &self.options
    }

    /// Compute the pending list from discovered migrations and applied records.
    ///
    /// Fails on duplicate ids, on unknown applied ids (unless ignored), and on
    /// out-of-order pending migrations under [`OutOfOrderPolicy::Reject`].
    pub fn plan<'m>(
        &self,
        migrations: &'m [Migration],
        applied: &[AppliedRecord],
    ) -> MigrateResult<MigrationPlan<'m>> {
        let mut ordered: Vec<&Migration> = migrations.iter().collect();
        ordered.sort_by(|a, b| a.id.cmp(&b.id));

        // Ids compare equal only when identical, so duplicates are adjacent
        if let Some(pair) = ordered.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(CoreError::DuplicateMigrationId {
                id: pair[0].id.to_string(),
                path1: pair[0].location(),
                path2: pair[1].location(),
            }
            .into());
        }

        let known: HashSet<&str> = ordered.iter().map(|m| m.id.as_str()).collect();
        let applied_ids: HashSet<&str> = applied.iter().map(|r| r.id.as_str()).collect();

        let unknown: Vec<MigrationId> = applied
            .iter()
            .filter(|r| !known.contains(r.id.as_str()))
            .map(|r| r.id.clone())
            .collect();
        if let Some(id) = unknown.first() {
            if !self.options.ignore_unknown {
                return Err(MigrateError::UnknownMigration { id: id.to_string() });
            }
        }

        let latest = applied
            .iter()
            .filter(|r| known.contains(r.id.as_str()))
            .map(|r| &r.id)
            .max();

        let mut pending: Vec<&Migration> = ordered
            .into_iter()
            .filter(|m| !applied_ids.contains(m.id.as_str()))
            .collect();

        let out_of_order: Vec<MigrationId> = match latest {
            Some(latest) => pending
                .iter()
                .filter(|m| m.id < *latest)
                .map(|m| m.id.clone())
                .collect(),
            None => Vec::new(),
        };
        if let (OutOfOrderPolicy::Reject, Some(id), Some(latest)) =
            (self.options.out_of_order, out_of_order.first(), latest)
        {
            return Err(MigrateError::OutOfOrder {
                id: id.to_string(),
                latest: latest.to_string(),
            });
        }

        if let Some(limit) = self.options.limit {
            pending.truncate(limit);
        }

        Ok(MigrationPlan {
            pending,
            out_of_order,
            already_applied: applied.len() - unknown.len(),
            unknown,
        })
    }

    /// Plan against the current store contents without changing anything.
    pub fn dry_run<'m>(
        &self,
        store: &dyn AppliedStore,
        migrations: &'m [Migration],
    ) -> MigrateResult<MigrationPlan<'m>> {
        let applied = read_applied(store)?;
        self.plan(migrations, &applied)
    }

    /// Apply every pending migration in order.
    pub fn run<S: Session + ?Sized>(
        &self,
        session: &S,
        store: &dyn AppliedStore,
        migrations: &[Migration],
    ) -> MigrateResult<MigrationReport> {
        store.bootstrap().map_err(MigrateError::Store)?;
        let applied = store.applied_records().map_err(MigrateError::Store)?;
        let plan = self.plan(migrations, &applied)?;

        for id in &plan.unknown {
            log::warn!("Ignoring unknown migration in database: {id}");
        }
        for id in &plan.out_of_order {
            log::warn!("Applying migration {id} out of order: a later migration is already applied");
        }

        let mut report = MigrationReport {
            applied: Vec::with_capacity(plan.pending.len()),
            already_applied: plan.already_applied,
        };

        for migration in plan.pending {
            apply_migration(session, migration)?;
            store
                .mark_applied(&migration.id, now())
                .map_err(|source| MigrateError::Bookkeeping {
                    id: migration.id.to_string(),
                    source,
                })?;
            log::info!("Applied migration {}", migration.id);
            report.applied.push(migration.id.clone());
        }

        if report.applied.is_empty() {
            log::info!(
                "Database is up to date ({} migration(s) applied)",
                report.already_applied
            );
        } else {
            log::info!(
                "Applied {} migration(s) on {}",
                report.applied.len(),
                session.db_type()
            );
        }
        Ok(report)
    }

    /// Report which discovered migrations are applied.
    pub fn status(
        &self,
        store: &dyn AppliedStore,
        migrations: &[Migration],
    ) -> MigrateResult<MigrationStatus> {
        let applied = read_applied(store)?;
        let mut applied_at: HashMap<&str, NaiveDateTime> = applied
            .iter()
            .map(|r| (r.id.as_str(), r.applied_at))
            .collect();

        let mut entries: Vec<StatusEntry> = migrations
            .iter()
            .map(|m| StatusEntry {
                id: m.id.clone(),
                applied_at: applied_at.remove(m.id.as_str()),
                path: m.path.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));

        let unknown = applied
            .iter()
            .filter(|r| applied_at.contains_key(r.id.as_str()))
            .cloned()
            .collect();

        Ok(MigrationStatus { entries, unknown })
    }
}

/// Applied records, or none when the store was never bootstrapped.
fn read_applied(store: &dyn AppliedStore) -> MigrateResult<Vec<AppliedRecord>> {
    if store.is_bootstrapped().map_err(MigrateError::Store)? {
        store.applied_records().map_err(MigrateError::Store)
    } else {
        Ok(Vec::new())
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc().trunc_subsecs(0)
}

/// Execute one migration's up statements, inside a transaction unless the
/// migration opted out.
fn apply_migration<S: Session + ?Sized>(session: &S, migration: &Migration) -> MigrateResult<()> {
    let fail = |step: ApplyStep, source: DbError| MigrateError::Apply {
        id: migration.id.to_string(),
        step,
        source,
    };
    let total = migration.up_statements.len();

    if migration.transactional {
        session.begin().map_err(|e| fail(ApplyStep::Begin, e))?;
    } else {
        log::debug!("Migration {} runs without a transaction", migration.id);
    }

    for (idx, statement) in migration.up_statements.iter().enumerate() {
        log::debug!("{} [{}/{}]: {}", migration.id, idx + 1, total, statement);
        if let Err(source) = session.execute_batch(statement) {
            if migration.transactional {
                if let Err(e) = session.rollback() {
                    log::error!("Rollback of migration {} failed: {e}", migration.id);
                }
            } else if idx > 0 {
                log::warn!(
                    "Migration {} is not transactional; its first {} statement(s) stay applied",
                    migration.id,
                    idx
                );
            }
            return Err(fail(ApplyStep::Statement(idx + 1), source));
        }
    }

    if migration.transactional {
        if let Err(source) = session.commit() {
            let _ = session.rollback();
            return Err(fail(ApplyStep::Commit, source));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;

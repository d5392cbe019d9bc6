//! Migrate command implementation

use anyhow::{Context, Result};
use sf_db::{migrate_with_options, MigrateOptions, Migrator, SqlAppliedStore};

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::context::ProjectContext;

/// Execute the migrate command
pub(crate) fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;

    if !ctx.config.migrations.enabled {
        log::info!(
            "Migrations are disabled for project '{}' (migrations.enabled = false)",
            ctx.config.name
        );
        return Ok(());
    }

    let options = MigrateOptions::from_config(&ctx.config.migrations).with_limit(args.limit);
    let session = ctx.open_session()?;

    if args.dry_run {
        let migrations = ctx.discover()?;
        let store = SqlAppliedStore::new(&session, &ctx.config.migrations.table)
            .context("Invalid migrations.table")?;
        let plan = Migrator::new(options)
            .dry_run(&store, &migrations)
            .context("Failed to plan migrations")?;
        if plan.pending.is_empty() {
            println!("Nothing to apply ({} already applied)", plan.already_applied);
            return Ok(());
        }
        println!("Would apply {} migration(s):", plan.pending.len());
        for migration in &plan.pending {
            let marker = if plan.out_of_order.contains(&migration.id) {
                "  (out of order)"
            } else {
                ""
            };
            println!("  {}{}", migration.id, marker);
        }
        return Ok(());
    }

    let report = migrate_with_options(&session, &ctx.config, &ctx.root, options)
        .context("Migration run failed")?;

    if report.applied.is_empty() {
        println!(
            "Database is up to date ({} already applied)",
            report.already_applied
        );
    } else {
        for id in &report.applied {
            println!("Applied {id}");
        }
        println!("{} migration(s) applied", report.applied.len());
    }
    Ok(())
}

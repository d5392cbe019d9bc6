//! Status command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use sf_db::{AppliedStore, MigrateOptions, MigrationStatus, Migrator, SqlAppliedStore};

use crate::cli::{GlobalArgs, StatusArgs};
use crate::context::ProjectContext;

const APPLIED_AT_DISPLAY: &str = "%Y-%m-%d %H:%M:%S";

/// One row of status output
#[derive(Debug, Serialize)]
struct StatusRow {
    id: String,
    state: &'static str,
    applied_at: Option<String>,
    path: Option<String>,
}

/// Full status output
#[derive(Debug, Serialize)]
struct StatusOutput {
    database: String,
    bootstrapped: bool,
    migrations: Vec<StatusRow>,
    pending: usize,
    unknown: Vec<StatusRow>,
}

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let migrations = ctx.discover()?;
    let session = ctx.open_session()?;
    let store = SqlAppliedStore::new(&session, &ctx.config.migrations.table)
        .context("Invalid migrations.table")?;

    let bootstrapped = store
        .is_bootstrapped()
        .context("Failed to inspect applied-state store")?;
    let status = Migrator::new(MigrateOptions::from_config(&ctx.config.migrations))
        .status(&store, &migrations)
        .context("Failed to read migration status")?;

    let output = build_output(ctx.database_path(), bootstrapped, &status);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_table(&output);
    }
    Ok(())
}

fn build_output(database: String, bootstrapped: bool, status: &MigrationStatus) -> StatusOutput {
    let migrations = status
        .entries
        .iter()
        .map(|entry| StatusRow {
            id: entry.id.to_string(),
            state: if entry.is_applied() {
                "applied"
            } else {
                "pending"
            },
            applied_at: entry
                .applied_at
                .map(|t| t.format(APPLIED_AT_DISPLAY).to_string()),
            path: entry.path.as_ref().map(|p| p.display().to_string()),
        })
        .collect();

    let unknown = status
        .unknown
        .iter()
        .map(|record| StatusRow {
            id: record.id.to_string(),
            state: "unknown",
            applied_at: Some(record.applied_at.format(APPLIED_AT_DISPLAY).to_string()),
            path: None,
        })
        .collect();

    StatusOutput {
        database,
        bootstrapped,
        migrations,
        pending: status.pending_count(),
        unknown,
    }
}

/// Print status in table format
fn print_table(output: &StatusOutput) {
    let rows: Vec<&StatusRow> = output
        .migrations
        .iter()
        .chain(output.unknown.iter())
        .collect();

    let id_width = rows.iter().map(|r| r.id.len()).max().unwrap_or(2).max(2);
    let state_width = 7;
    let time_width = 19;

    println!("Database: {}", output.database);
    if !output.bootstrapped {
        println!("Applied-state table not created yet; every migration is pending");
    }
    println!();

    println!(
        "{:<id_width$}  {:<state_width$}  {:<time_width$}  PATH",
        "ID", "STATE", "APPLIED_AT",
    );
    println!(
        "{:-<id_width$}  {:-<state_width$}  {:-<time_width$}  {}",
        "",
        "",
        "",
        "-".repeat(40),
    );

    for row in rows {
        println!(
            "{:<id_width$}  {:<state_width$}  {:<time_width$}  {}",
            row.id,
            row.state,
            row.applied_at.as_deref().unwrap_or("-"),
            row.path.as_deref().unwrap_or("-"),
        );
    }

    println!();
    println!(
        "{} migration(s), {} pending, {} unknown",
        output.migrations.len(),
        output.pending,
        output.unknown.len()
    );
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;

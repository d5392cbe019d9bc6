//! List command implementation

use anyhow::Result;
use sf_core::Migration;

use crate::cli::GlobalArgs;
use crate::context::ProjectContext;

/// Execute the ls command
pub(crate) fn execute(global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let migrations = ctx.discover()?;

    if migrations.is_empty() {
        println!(
            "No migrations found in {}",
            ctx.config.migrations_dir_absolute(&ctx.root).display()
        );
        return Ok(());
    }
    print_table(&migrations);
    Ok(())
}

/// Print migrations in table format
fn print_table(migrations: &[Migration]) {
    let id_width = migrations
        .iter()
        .map(|m| m.id.len())
        .max()
        .unwrap_or(2)
        .max(2);

    println!("{:<id_width$}  {:>2}  {:>4}  {:<5}  PATH", "ID", "UP", "DOWN", "TX");
    println!("{:-<id_width$}  --  ----  -----  {}", "", "-".repeat(40));

    for migration in migrations {
        println!(
            "{:<id_width$}  {:>2}  {:>4}  {:<5}  {}",
            migration.id,
            migration.up_statements.len(),
            migration.down_statements.len(),
            if migration.transactional { "yes" } else { "no" },
            migration.location(),
        );
    }

    println!();
    println!("{} migration(s)", migrations.len());
}

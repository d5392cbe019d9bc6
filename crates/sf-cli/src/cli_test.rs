use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Catches short flag conflicts and duplicate args across the tree
    Cli::command().debug_assert();
}

#[test]
fn test_parse_migrate_with_globals() {
    let cli = Cli::try_parse_from([
        "sf",
        "migrate",
        "--dry-run",
        "--limit",
        "2",
        "-p",
        "proj",
        "--database",
        ":memory:",
    ])
    .unwrap();

    assert_eq!(cli.global.project_dir, "proj");
    assert_eq!(cli.global.database.as_deref(), Some(":memory:"));
    match cli.command {
        Commands::Migrate(args) => {
            assert!(args.dry_run);
            assert_eq!(args.limit, Some(2));
        }
        other => panic!("Expected migrate, got {other:?}"),
    }
}

#[test]
fn test_parse_status_json() {
    let cli = Cli::try_parse_from(["sf", "-v", "status", "--json"]).unwrap();
    assert!(cli.global.verbose);
    assert_eq!(cli.global.project_dir, ".");
    assert!(matches!(cli.command, Commands::Status(StatusArgs { json: true })));
}

#[test]
fn test_rejects_non_numeric_limit() {
    assert!(Cli::try_parse_from(["sf", "migrate", "--limit", "many"]).is_err());
}

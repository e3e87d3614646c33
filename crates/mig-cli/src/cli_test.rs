use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_up_defaults_to_head() {
    let cli = Cli::try_parse_from(["migrations", "up"]).unwrap();
    match cli.command {
        Commands::Up(args) => {
            assert_eq!(args.revision, "head");
            assert!(!args.sql);
        }
        other => panic!("expected up, got {other:?}"),
    }
}

#[test]
fn test_down_requires_revision() {
    assert!(Cli::try_parse_from(["migrations", "down"]).is_err());
    let cli = Cli::try_parse_from(["migrations", "down", "-r", "base", "--sql"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Down(DownArgs { ref revision, sql: true }) if revision == "base"
    ));
}

#[test]
fn test_merge_collects_revisions() {
    let cli = Cli::try_parse_from([
        "migrations", "merge", "-m", "join", "-r", "ae10", "-r", "1975",
    ])
    .unwrap();
    match cli.command {
        Commands::Merge(args) => assert_eq!(args.revisions, vec!["ae10", "1975"]),
        other => panic!("expected merge, got {other:?}"),
    }
}

#[test]
fn test_global_args_after_subcommand() {
    let cli =
        Cli::try_parse_from(["migrations", "status", "-t", "prod", "-o", "json", "-v"]).unwrap();
    assert_eq!(cli.global.target.as_deref(), Some("prod"));
    assert!(cli.global.verbose);
    assert!(matches!(
        cli.command,
        Commands::Status(StatusArgs {
            output: OutputFormat::Json
        })
    ));
}

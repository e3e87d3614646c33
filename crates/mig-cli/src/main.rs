//! migrations - revision-graph schema migrations for DuckDB and SQLite

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::common::ExitCode;
use commands::{check, down, generate, heads, history, init, merge, new, status, up};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Err(err) = run(&cli).await {
        match err.downcast_ref::<ExitCode>() {
            Some(code) => std::process::exit(code.0),
            None => {
                eprintln!("Error: {err:#}");
                std::process::exit(1);
            }
        }
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let global = &cli.global;
    match &cli.command {
        Commands::Init(args) => init::execute(args, global).await,
        Commands::Generate(args) => generate::execute(args, global).await,
        Commands::New(args) => new::execute(args, global).await,
        Commands::Merge(args) => merge::execute(args, global).await,
        Commands::Up(args) => up::execute(args, global).await,
        Commands::Down(args) => down::execute(args, global).await,
        Commands::Status(args) => status::execute(args, global).await,
        Commands::History(args) => history::execute(args, global).await,
        Commands::Heads(args) => heads::execute(args, global).await,
        Commands::Check(args) => check::execute(args, global).await,
    }
}

/// `RUST_LOG` wins; otherwise warn, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(false)
        .init();
}

//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// migrations - revision-graph schema migrations for DuckDB and SQLite
#[derive(Parser, Debug)]
#[command(name = "migrations")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override target (database connection)
    #[arg(short, long, global = true)]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scaffold a new migrations project
    Init(InitArgs),

    /// Autogenerate a revision from the difference between models and the head snapshot
    Generate(GenerateArgs),

    /// Create an empty revision on top of the head
    New(NewArgs),

    /// Create a merge revision joining several heads
    Merge(MergeArgs),

    /// Apply revisions up to a target
    Up(UpArgs),

    /// Revert revisions down to a target
    Down(DownArgs),

    /// Show applied, pending and unknown revisions
    Status(StatusArgs),

    /// List revisions, newest first
    History(HistoryArgs),

    /// List the heads of the revision graph
    Heads(HeadsArgs),

    /// Fail if the graph has several heads or the models have drifted
    Check(CheckArgs),
}

/// Backend type written by `init`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitDatabase {
    /// DuckDB file
    Duckdb,
    /// SQLite file
    Sqlite,
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Project name (also the directory created)
    pub name: String,

    /// Database backend
    #[arg(long, value_enum, default_value = "duckdb")]
    pub database_type: InitDatabase,

    /// Database file path, relative to the project
    #[arg(long)]
    pub database_path: Option<String>,
}

/// Arguments for the generate command
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Revision message
    #[arg(short, long)]
    pub message: String,

    /// Write a revision even when nothing changed
    #[arg(long)]
    pub allow_empty: bool,
}

/// Arguments for the new command
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Revision message
    #[arg(short, long)]
    pub message: String,
}

/// Arguments for the merge command
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Revision message
    #[arg(short, long)]
    pub message: String,

    /// Revisions to merge (default: every head)
    #[arg(short = 'r', long = "revision")]
    pub revisions: Vec<String>,
}

/// Arguments for the up command
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Target revision: `head`, `heads`, a revision id, or a prefix
    #[arg(short = 'r', long, default_value = "head")]
    pub revision: String,

    /// Print the SQL instead of executing it
    #[arg(long)]
    pub sql: bool,
}

/// Arguments for the down command
#[derive(Args, Debug)]
pub struct DownArgs {
    /// Target revision: `base`, a revision id, or a prefix
    #[arg(short = 'r', long)]
    pub revision: String,

    /// Print the SQL instead of executing it
    #[arg(long)]
    pub sql: bool,
}

/// Table or JSON output
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON output
    Json,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Skip the database lookup of applied revisions
    #[arg(long)]
    pub offline: bool,
}

/// Arguments for the heads command
#[derive(Args, Debug)]
pub struct HeadsArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

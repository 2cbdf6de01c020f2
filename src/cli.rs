//! CLI argument parsing for the triage workflow.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "triage",
    version,
    about = "Score inbound opportunities from a spreadsheet and alert on strong fits",
    after_help = "Commands:\n  init                 Write a triage.json stub and create the ledger\n  check                Validate config and show resolved settings\n  run                  Triage every unprocessed row once (or --every SECS)\n  ledger               Show recent ledger entries\n\nExamples:\n  triage init\n  triage check\n  triage run --limit 10\n  triage run --every 300\n  triage ledger --limit 5 --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Config file (default: ./triage.json, then the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level workflow commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Init(InitArgs),
    Check(CheckArgs),
    Run(RunArgs),
    Ledger(LedgerArgs),
}

/// Init command inputs.
#[derive(Parser, Debug)]
#[command(about = "Write a config stub and create the ledger database")]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Check command inputs.
#[derive(Parser, Debug)]
#[command(about = "Validate config and print resolved, secret-redacted settings")]
pub struct CheckArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Run command inputs.
#[derive(Parser, Debug)]
#[command(about = "Triage unprocessed rows")]
pub struct RunArgs {
    /// Repeat the pass every SECS seconds until interrupted
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub every: Option<u64>,

    /// Process at most N rows per pass
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Emit the pass report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Ledger command inputs.
#[derive(Parser, Debug)]
#[command(about = "Show the most recent ledger entries")]
pub struct LedgerArgs {
    /// Number of entries to show
    #[arg(long, value_name = "N", default_value_t = 20)]
    pub limit: usize,

    /// Emit entries as JSON
    #[arg(long)]
    pub json: bool,
}

/// Settings that win over the config file and environment.
#[derive(Parser, Debug, Default, Clone)]
pub struct OverrideArgs {
    /// Spreadsheet to read
    #[arg(long, value_name = "ID")]
    pub spreadsheet_id: Option<String>,

    /// Use a local LM command instead of the configured backend
    #[arg(long, value_name = "CMD")]
    pub lm: Option<String>,

    /// Alert threshold on the model's score scale
    #[arg(long, value_name = "SCORE")]
    pub threshold: Option<f64>,
}

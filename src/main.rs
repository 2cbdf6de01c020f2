//! Inbound opportunity triage.
//!
//! Reads new form submissions from a spreadsheet, scores each description
//! against an investment thesis with a language model, records the result
//! in a local ledger, alerts on strong fits, and marks the row as handled.
mod cli;
mod config;
mod enrich;
mod error;
mod http;
mod ledger;
mod notify;
mod pipeline;
mod process;
mod record;
mod sheets;
mod workflow;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::RootArgs::parse();
    // Before tracing, so RUST_LOG may come from .env too.
    let dotenv = dotenvy::dotenv();
    init_tracing(args.verbose);
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env"),
    }
    let config = args.config.as_deref();

    match &args.command {
        cli::Command::Init(init) => workflow::run_init(config, init),
        cli::Command::Check(check) => workflow::run_check(config, check),
        cli::Command::Run(run) => workflow::run_run(config, run),
        cli::Command::Ledger(ledger) => workflow::run_ledger(config, ledger),
    }
}

/// Logs go to stderr so stdout stays clean for reports and `--json`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

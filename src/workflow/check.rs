//! `triage check`: validate config and show what a run would use.
use super::context::TriageContext;
use crate::cli::CheckArgs;
use crate::config::InferenceBackend;
use crate::process::resolve_program;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run_check(config: Option<&Path>, args: &CheckArgs) -> Result<()> {
    let ctx = TriageContext::load_validated(config, &args.overrides)?;
    let redacted = ctx.config.redacted()?;
    println!("config: {}", ctx.config_path.display());
    println!("ledger: {}", ctx.ledger_path().display());
    println!(
        "{}",
        serde_json::to_string_pretty(&redacted).context("render config")?
    );

    if let Some(command) = ctx.config.sheets.token_command.as_deref() {
        let program = resolve_program(command).context("sheets.token_command")?;
        println!("token command: {}", program.display());
    }
    if ctx.config.inference.backend == InferenceBackend::Command {
        if let Some(command) = ctx.config.inference.command.as_deref() {
            let program = resolve_program(command).context("inference.command")?;
            println!("lm command: {}", program.display());
        }
    }
    println!("ok");
    Ok(())
}

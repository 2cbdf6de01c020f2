//! `triage init`: write a config stub and create the ledger.
use super::context::relative_to_config;
use crate::cli::InitArgs;
use crate::config::{default_config, write_config, DEFAULT_CONFIG_FILE};
use crate::ledger::SqliteLedger;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

pub fn run_init(config: Option<&Path>, args: &InitArgs) -> Result<()> {
    let config_path = config
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    if config_path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            config_path.display()
        ));
    }
    let config = default_config();
    write_config(&config_path, &config)?;
    println!("wrote {}", config_path.display());

    let ledger_path = relative_to_config(&config_path, &config.ledger.path);
    let ledger = SqliteLedger::open(&ledger_path)
        .with_context(|| format!("open ledger {}", ledger_path.display()))?;
    println!(
        "ledger ready at {} ({} entries)",
        ledger_path.display(),
        ledger.count()?
    );
    Ok(())
}

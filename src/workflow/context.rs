//! Loading and resolving the config a command runs against.
use crate::cli::OverrideArgs;
use crate::config::{load_config, resolve_config_path, ConfigOverrides, TriageConfig};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// Resolved config plus where it came from.
pub(crate) struct TriageContext {
    pub config_path: PathBuf,
    pub config: TriageConfig,
}

impl TriageContext {
    /// Load the config file and fill secrets from flags and the environment.
    pub fn load(explicit: Option<&Path>, overrides: &OverrideArgs) -> Result<Self> {
        let config_path = resolve_config_path(explicit);
        if !config_path.is_file() {
            return Err(anyhow!(
                "config not found at {} (run `triage init` first)",
                config_path.display()
            ));
        }
        let mut config = load_config(&config_path)?
            .resolve(&ConfigOverrides::from(overrides), |name| std::env::var(name).ok());
        if let Some(path) = config.sheets.service_account_file.take() {
            config.sheets.service_account_file = Some(relative_to_config(&config_path, &path));
        }
        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load and validate in one step.
    pub fn load_validated(explicit: Option<&Path>, overrides: &OverrideArgs) -> Result<Self> {
        let ctx = Self::load(explicit, overrides)?;
        ctx.config
            .validate()
            .with_context(|| format!("invalid config {}", ctx.config_path.display()))?;
        Ok(ctx)
    }

    pub fn ledger_path(&self) -> PathBuf {
        relative_to_config(&self.config_path, &self.config.ledger.path)
    }
}

/// Relative paths in the config are taken from the config file's directory.
pub(crate) fn relative_to_config(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

impl From<&OverrideArgs> for ConfigOverrides {
    fn from(args: &OverrideArgs) -> Self {
        Self {
            spreadsheet_id: args.spreadsheet_id.clone(),
            lm_command: args.lm.clone(),
            threshold: args.threshold,
        }
    }
}

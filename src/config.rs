//! Triage configuration.
//!
//! Everything a run needs (endpoints, credentials, column names, threshold)
//! lives in one `TriageConfig` that is loaded once and passed down. The
//! environment is only consulted here, when secrets are resolved.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current schema version for `triage.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "triage.json";

pub const ENV_SPREADSHEET_ID: &str = "SPREADSHEET_ID";
pub const ENV_SHEETS_TOKEN: &str = "TRIAGE_SHEETS_TOKEN";
pub const ENV_SERVICE_ACCOUNT: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const ENV_GEMINI_API_KEY: &str = "GOOGLE_GEMINI_API_KEY";
pub const ENV_LM_COMMAND: &str = "TRIAGE_LM_COMMAND";
pub const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-pro";
const DEFAULT_THESIS: &str = "B2B SaaS companies in Pakistan with early traction";
const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriageConfig {
    pub schema_version: u32,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Per-request timeout applied to every HTTP call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SheetsConfig {
    pub spreadsheet_id: Option<String>,
    pub sheet_name: String,
    pub api_base: String,
    /// Pre-minted OAuth bearer token.
    pub access_token: Option<String>,
    /// Service-account key JSON; relative paths are taken from the config file's directory.
    pub service_account_file: Option<PathBuf>,
    /// Command printing a bearer token on stdout, e.g. `gcloud auth print-access-token`.
    pub token_command: Option<String>,
    pub columns: ColumnNames,
}

/// Header names used to locate fields in the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ColumnNames {
    pub timestamp: String,
    pub company_name: String,
    pub contact_email: String,
    pub company_website: String,
    pub description: String,
    pub status: String,
    pub summary: String,
    pub score: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InferenceBackend {
    #[default]
    Gemini,
    Command,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct InferenceConfig {
    pub backend: InferenceBackend,
    pub model: String,
    pub api_base: String,
    pub api_key: Option<String>,
    /// Local LM command (prompt on stdin, JSON on stdout); used by the `command` backend.
    pub command: Option<String>,
    /// Investment thesis the model scores descriptions against.
    pub thesis: String,
    /// Upper bound of the alignment score; answers outside `0..=score_scale_max` are rejected.
    pub score_scale_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
    /// Alerts fire when `score >= threshold`.
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LedgerConfig {
    pub path: PathBuf,
}

impl SheetsConfig {
    /// Whether any way of obtaining a bearer token is configured.
    pub fn has_credentials(&self) -> bool {
        !blank(self.access_token.as_deref())
            || self
                .service_account_file
                .as_ref()
                .is_some_and(|path| !path.as_os_str().is_empty())
            || !blank(self.token_command.as_deref())
    }
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            sheet_name: "Form Responses 1".to_string(),
            api_base: DEFAULT_SHEETS_API_BASE.to_string(),
            access_token: None,
            service_account_file: None,
            token_command: None,
            columns: ColumnNames::default(),
        }
    }
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            timestamp: "Timestamp".to_string(),
            company_name: "Company Name".to_string(),
            contact_email: "Contact Email".to_string(),
            company_website: "Company Website".to_string(),
            description: "Opportunity Description".to_string(),
            status: "Status".to_string(),
            summary: "AI Summary".to_string(),
            score: "Alignment Score".to_string(),
        }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            backend: InferenceBackend::Gemini,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            api_key: None,
            command: None,
            thesis: DEFAULT_THESIS.to_string(),
            score_scale_max: 5.0,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            threshold: 4.0,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("opportunities.db"),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub spreadsheet_id: Option<String>,
    pub lm_command: Option<String>,
    pub threshold: Option<f64>,
}

/// Build the default config written by `triage init`.
pub fn default_config() -> TriageConfig {
    TriageConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        sheets: SheetsConfig::default(),
        inference: InferenceConfig::default(),
        notify: NotifyConfig::default(),
        ledger: LedgerConfig::default(),
        timeout_secs: default_timeout_secs(),
    }
}

/// Resolve the config path: explicit flag, else `triage.json` in the cwd,
/// else the per-user config directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("inbound-triage").join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.is_file())
        .unwrap_or(local)
}

pub fn load_config(path: &Path) -> Result<TriageConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: TriageConfig =
        serde_json::from_slice(&bytes).context("parse triage config JSON")?;
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported triage config schema_version {} (expected {})",
            config.schema_version,
            CONFIG_SCHEMA_VERSION
        ));
    }
    Ok(config)
}

/// Persist a config in a stable JSON format.
pub fn write_config(path: &Path, config: &TriageConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config dir {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize triage config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

impl TriageConfig {
    /// Fill unset secrets: command-line overrides first, then `env`.
    ///
    /// `env` is injected so callers decide where variables come from; the
    /// binary passes `std::env::var`.
    pub fn resolve<F>(mut self, overrides: &ConfigOverrides, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        if let Some(id) = &overrides.spreadsheet_id {
            self.sheets.spreadsheet_id = Some(id.clone());
        }
        if let Some(command) = &overrides.lm_command {
            self.inference.backend = InferenceBackend::Command;
            self.inference.command = Some(command.clone());
        }
        if let Some(threshold) = overrides.threshold {
            self.notify.threshold = threshold;
        }

        if self.sheets.spreadsheet_id.is_none() {
            self.sheets.spreadsheet_id = env(ENV_SPREADSHEET_ID);
        }
        if !self.sheets.has_credentials() {
            self.sheets.access_token = env(ENV_SHEETS_TOKEN);
        }
        if !self.sheets.has_credentials() {
            self.sheets.service_account_file = env(ENV_SERVICE_ACCOUNT).map(PathBuf::from);
        }
        if self.inference.api_key.is_none() {
            self.inference.api_key = env(ENV_GEMINI_API_KEY);
        }
        if self.inference.command.is_none() {
            self.inference.command = env(ENV_LM_COMMAND);
        }
        if self.notify.webhook_url.is_none() {
            self.notify.webhook_url = env(ENV_SLACK_WEBHOOK_URL);
        }
        self
    }

    /// Check that a resolved config can drive a run.
    pub fn validate(&self) -> Result<()> {
        let sheets = &self.sheets;
        if blank(sheets.spreadsheet_id.as_deref()) {
            return Err(anyhow!(
                "sheets.spreadsheet_id is required (or set {ENV_SPREADSHEET_ID})"
            ));
        }
        if sheets.sheet_name.trim().is_empty() {
            return Err(anyhow!("sheets.sheet_name must be non-empty"));
        }
        if !sheets.has_credentials() {
            return Err(anyhow!(
                "sheets.access_token, sheets.service_account_file or sheets.token_command is required (or set {ENV_SHEETS_TOKEN} or {ENV_SERVICE_ACCOUNT})"
            ));
        }
        validate_columns(&sheets.columns)?;

        let inference = &self.inference;
        match inference.backend {
            InferenceBackend::Gemini => {
                if blank(inference.api_key.as_deref()) {
                    return Err(anyhow!(
                        "inference.api_key is required for the gemini backend (or set {ENV_GEMINI_API_KEY})"
                    ));
                }
                if inference.model.trim().is_empty() {
                    return Err(anyhow!("inference.model must be non-empty"));
                }
            }
            InferenceBackend::Command => {
                if blank(inference.command.as_deref()) {
                    return Err(anyhow!(
                        "inference.command is required for the command backend (or set {ENV_LM_COMMAND})"
                    ));
                }
            }
        }
        if inference.score_scale_max.is_nan() || inference.score_scale_max <= 1.0 {
            return Err(anyhow!(
                "inference.score_scale_max must be greater than 1 (got {})",
                inference.score_scale_max
            ));
        }

        if blank(self.notify.webhook_url.as_deref()) {
            return Err(anyhow!(
                "notify.webhook_url is required (or set {ENV_SLACK_WEBHOOK_URL})"
            ));
        }
        let threshold = self.notify.threshold;
        if !(0.0..=inference.score_scale_max).contains(&threshold) {
            return Err(anyhow!(
                "notify.threshold must be within 0..={} (got {threshold})",
                inference.score_scale_max
            ));
        }

        if self.ledger.path.as_os_str().is_empty() {
            return Err(anyhow!("ledger.path must be non-empty"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be positive"));
        }
        Ok(())
    }

    /// JSON view with credentials masked, for `triage check`.
    pub fn redacted(&self) -> Result<serde_json::Value> {
        let mut copy = self.clone();
        mask(&mut copy.sheets.access_token);
        mask(&mut copy.inference.api_key);
        mask(&mut copy.notify.webhook_url);
        serde_json::to_value(&copy).context("serialize redacted config")
    }
}

fn validate_columns(columns: &ColumnNames) -> Result<()> {
    let named = [
        ("timestamp", &columns.timestamp),
        ("company_name", &columns.company_name),
        ("contact_email", &columns.contact_email),
        ("company_website", &columns.company_website),
        ("description", &columns.description),
        ("status", &columns.status),
        ("summary", &columns.summary),
        ("score", &columns.score),
    ];
    for (label, name) in named {
        if name.trim().is_empty() {
            return Err(anyhow!("sheets.columns.{label} must be non-empty"));
        }
    }
    Ok(())
}

fn blank(value: Option<&str>) -> bool {
    value.map(str::trim).is_none_or(str::is_empty)
}

fn mask(value: &mut Option<String>) {
    if value.is_some() {
        *value = Some(REDACTED.to_string());
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

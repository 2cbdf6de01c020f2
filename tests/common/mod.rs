//! Shared test infrastructure for integration tests.
//!
//! Each fixture owns a temp dir with a `triage.json` pointing every remote
//! endpoint at one mockito server, and runs the built `triage` binary
//! against it.

use serde_json::{json, Value};
use std::env;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Environment variables that would otherwise leak real credentials in.
const SECRET_VARS: [&str; 6] = [
    "SPREADSHEET_ID",
    "TRIAGE_SHEETS_TOKEN",
    "GOOGLE_APPLICATION_CREDENTIALS",
    "GOOGLE_GEMINI_API_KEY",
    "TRIAGE_LM_COMMAND",
    "SLACK_WEBHOOK_URL",
];

pub const SPREADSHEET_ID: &str = "sheet-it";
pub const SHEETS_TOKEN: &str = "ya29.test-token";
pub const WEBHOOK_PATH: &str = "/services/T000/B000/XXXX";

pub struct TriageFixture {
    pub dir: TempDir,
    pub config_path: PathBuf,
}

fn manifest_dir() -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()))
}

/// LM command that answers every prompt with `tests/fixtures/<response>`.
pub fn mock_lm_command(response: &str) -> String {
    let script = manifest_dir().join("tests/mock-lm.sh");
    let answer = manifest_dir().join("tests/fixtures").join(response);
    shell_words::join([
        "sh".to_string(),
        script.display().to_string(),
        answer.display().to_string(),
    ])
}

/// Config JSON with every remote endpoint on `server_url`.
pub fn base_config(server_url: &str) -> Value {
    json!({
        "schema_version": 1,
        "sheets": {
            "spreadsheet_id": SPREADSHEET_ID,
            "api_base": server_url,
            "access_token": SHEETS_TOKEN,
        },
        "inference": {
            "backend": "gemini",
            "api_base": server_url,
            "api_key": "gemini-test-key",
        },
        "notify": {
            "webhook_url": format!("{server_url}{WEBHOOK_PATH}"),
            "threshold": 4.0,
        },
        "ledger": {"path": "opportunities.db"},
        "timeout_secs": 5,
    })
}

/// Values response for a sheet with the standard header plus `rows`.
pub fn sheet_body(rows: &[Value]) -> String {
    let mut values = vec![json!([
        "Timestamp",
        "Company Name",
        "Contact Email",
        "Company Website",
        "Opportunity Description",
        "Status",
        "AI Summary",
        "Alignment Score"
    ])];
    values.extend(rows.iter().cloned());
    json!({
        "range": "'Form Responses 1'!A1:Z1000",
        "majorDimension": "ROWS",
        "values": values,
    })
    .to_string()
}

impl TriageFixture {
    pub fn new(config: &Value) -> anyhow::Result<Self> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("triage.json");
        std::fs::write(&config_path, serde_json::to_string_pretty(config)?)?;
        Ok(Self { dir, config_path })
    }

    /// Empty temp dir with no config written yet.
    pub fn bare() -> anyhow::Result<Self> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("triage.json");
        Ok(Self { dir, config_path })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Run `triage --config <fixture config> <args...>`.
    pub fn triage(&self, args: &[&str]) -> anyhow::Result<Output> {
        let mut command = Command::new(env!("CARGO_BIN_EXE_triage"));
        command
            .arg("--config")
            .arg(&self.config_path)
            .args(args)
            .current_dir(self.dir.path())
            .env("RUST_LOG", "warn");
        for var in SECRET_VARS {
            command.env_remove(var);
        }
        Ok(command.output()?)
    }

    /// Run and parse stdout as JSON, failing with stderr on a non-zero exit.
    pub fn triage_json(&self, args: &[&str]) -> anyhow::Result<Value> {
        let output = self.triage(args)?;
        if !output.status.success() {
            return Err(anyhow::anyhow!(
                "triage {:?} failed: {}",
                args,
                String::from_utf8_lossy(&output.stderr)
            ));
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

//! Google Sheets v4 values API client.
use super::auth::{ServiceAccountKey, SHEETS_SCOPE};
use super::grid::{cell_range, cell_text, quote_sheet_name, unprocessed_records, SheetLayout};
use super::{RowSource, SinkWriter};
use crate::config::{ColumnNames, SheetsConfig};
use crate::error::{describe_http_error, Result, TriageError};
use crate::http::join_url;
use crate::process::run_command;
use crate::record::{OpportunityRecord, RecordStatus};
use serde::Deserialize;
use serde_json::{json, Value};
use std::cell::OnceCell;

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Reads and updates one sheet (tab) of one spreadsheet.
pub struct SheetsClient {
    agent: ureq::Agent,
    api_base: String,
    spreadsheet_id: String,
    sheet_name: String,
    columns: ColumnNames,
    token: String,
    layout: OnceCell<SheetLayout>,
}

impl SheetsClient {
    /// Build a client from config, minting a token if needed.
    pub fn from_config(agent: ureq::Agent, config: &SheetsConfig) -> Result<Self> {
        let token = resolve_token(&agent, config)?;
        Self::new(agent, config, token)
    }

    pub fn new(agent: ureq::Agent, config: &SheetsConfig, token: String) -> Result<Self> {
        let spreadsheet_id = config
            .spreadsheet_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| TriageError::Config("sheets.spreadsheet_id is not set".to_string()))?;
        Ok(Self {
            agent,
            api_base: config.api_base.clone(),
            spreadsheet_id,
            sheet_name: config.sheet_name.clone(),
            columns: config.columns.clone(),
            token,
            layout: OnceCell::new(),
        })
    }

    fn read_values(&self, range: &str) -> Result<Vec<Vec<Value>>> {
        let url = join_url(
            &self.api_base,
            &format!(
                "spreadsheets/{}/values/{}",
                self.spreadsheet_id,
                urlencoding::encode(range)
            ),
        );
        let mut response = self
            .agent
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .call()
            .map_err(|e| {
                TriageError::Access(format!("read {range}: {}", describe_http_error(&e)))
            })?;
        let body: ValueRange = response
            .body_mut()
            .read_json()
            .map_err(|e| TriageError::Access(format!("decode {range}: {e}")))?;
        Ok(body.values)
    }

    /// Column layout, read from the header row on first use.
    fn layout(&self) -> Result<&SheetLayout> {
        if let Some(layout) = self.layout.get() {
            return Ok(layout);
        }
        let range = format!("{}!1:1", quote_sheet_name(&self.sheet_name));
        let values = self.read_values(&range)?;
        let header: Vec<String> = values
            .first()
            .map(|row| row.iter().map(cell_text).collect())
            .unwrap_or_default();
        let layout = SheetLayout::from_header(&header, &self.columns)?;
        Ok(self.layout.get_or_init(|| layout))
    }
}

impl RowSource for SheetsClient {
    fn fetch_unprocessed(&self) -> Result<Vec<OpportunityRecord>> {
        let values = self.read_values(&quote_sheet_name(&self.sheet_name))?;
        if values.is_empty() {
            tracing::info!(sheet = %self.sheet_name, "sheet is empty");
            return Ok(Vec::new());
        }
        let (layout, records) = unprocessed_records(&values, &self.columns)?;
        let _ = self.layout.set(layout);
        tracing::info!(
            sheet = %self.sheet_name,
            rows = values.len() - 1,
            unprocessed = records.len(),
            "fetched sheet"
        );
        Ok(records)
    }
}

impl SinkWriter for SheetsClient {
    fn write_back(&self, record: &OpportunityRecord) -> Result<()> {
        let layout = self.layout()?;
        let (summary, score) = match (&record.status, &record.analysis) {
            (RecordStatus::Processed, Some(analysis)) => {
                (analysis.summary.clone(), score_cell(analysis.score))
            }
            _ => (record.failure.clone().unwrap_or_default(), json!("")),
        };
        let cell = |column: usize, value: Value| {
            json!({
                "range": cell_range(&self.sheet_name, column, record.row),
                "values": [[value]],
            })
        };
        let body = json!({
            // Summaries come from form text; never let the sheet parse them.
            "valueInputOption": "RAW",
            "data": [
                cell(layout.status, json!(record.status.as_cell())),
                cell(layout.summary, json!(summary)),
                cell(layout.score, score),
            ],
        });
        let url = join_url(
            &self.api_base,
            &format!("spreadsheets/{}/values:batchUpdate", self.spreadsheet_id),
        );
        self.agent
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send_json(&body)
            .map_err(|e| {
                TriageError::Access(format!(
                    "update row {}: {}",
                    record.row,
                    describe_http_error(&e)
                ))
            })?;
        tracing::debug!(row = record.row, status = %record.status, "row updated");
        Ok(())
    }
}

/// Whole scores go out as integers so the sheet shows `4`, not `4.0`.
fn score_cell(score: f64) -> Value {
    if score.fract().abs() < f64::EPSILON && score.abs() < 1e9 {
        json!(score as i64)
    } else {
        json!(score)
    }
}

/// Pick a bearer token: a configured one, else a service-account exchange,
/// else the output of `token_command`.
fn resolve_token(agent: &ureq::Agent, config: &SheetsConfig) -> Result<String> {
    if let Some(token) = config
        .access_token
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Ok(token.to_string());
    }
    if let Some(path) = config
        .service_account_file
        .as_deref()
        .filter(|p| !p.as_os_str().is_empty())
    {
        return ServiceAccountKey::load(path)?.fetch_token(agent, SHEETS_SCOPE);
    }
    let Some(command) = config
        .token_command
        .as_deref()
        .filter(|c| !c.trim().is_empty())
    else {
        return Err(TriageError::Access(
            "no sheets credentials: set an access token, service account file or token command"
                .to_string(),
        ));
    };
    let output = run_command(command, None)
        .map_err(|e| TriageError::Access(format!("token command: {e:#}")))?;
    let token = output.trim();
    if token.is_empty() {
        return Err(TriageError::Access(
            "token command printed nothing".to_string(),
        ));
    }
    Ok(token.to_string())
}

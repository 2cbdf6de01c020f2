//! Per-run and per-row results.
use crate::record::{format_score, OpportunityRecord, RecordStatus};
use serde::Serialize;

/// What happened to one row during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowOutcome {
    pub row: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub alert_due: bool,
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_back_error: Option<String>,
}

impl RowOutcome {
    pub(crate) fn new(record: &OpportunityRecord) -> Self {
        Self {
            row: record.row,
            company: record.company_name.clone(),
            status: record.status,
            score: None,
            alert_due: false,
            notified: false,
            ledger_id: None,
            failure: None,
            ledger_error: None,
            delivery_error: None,
            write_back_error: None,
        }
    }

    /// Copy the final record state into the outcome.
    pub(crate) fn settle(&mut self, record: &OpportunityRecord) {
        self.status = record.status;
        self.score = record.score();
        self.notified = record.notification_sent;
        self.failure = record.failure.clone();
    }
}

/// Totals for one pass over the sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub elapsed_ms: u64,
    /// Unprocessed rows the sheet offered.
    pub available: usize,
    /// Rows actually taken this run (after `--limit`).
    pub fetched: usize,
    pub processed: usize,
    pub failed: usize,
    pub notified: usize,
    pub ledger_failures: usize,
    pub delivery_failures: usize,
    pub write_back_failures: usize,
    pub rows: Vec<RowOutcome>,
}

impl RunReport {
    pub(crate) fn push(&mut self, outcome: RowOutcome) {
        match outcome.status {
            RecordStatus::Processed => self.processed += 1,
            RecordStatus::Failed => self.failed += 1,
            RecordStatus::Unprocessed => {}
        }
        if outcome.notified {
            self.notified += 1;
        }
        if outcome.ledger_error.is_some() {
            self.ledger_failures += 1;
        }
        if outcome.delivery_error.is_some() {
            self.delivery_failures += 1;
        }
        if outcome.write_back_error.is_some() {
            self.write_back_failures += 1;
        }
        self.rows.push(outcome);
    }

    /// One-line human summary.
    pub fn summary_line(&self) -> String {
        let mut line = format!(
            "{} fetched, {} processed, {} failed, {} notified",
            self.fetched, self.processed, self.failed, self.notified
        );
        if self.available > self.fetched {
            line.push_str(&format!(", {} deferred", self.available - self.fetched));
        }
        let problems = [
            (self.ledger_failures, "ledger"),
            (self.delivery_failures, "delivery"),
            (self.write_back_failures, "write-back"),
        ];
        for (count, label) in problems {
            if count > 0 {
                line.push_str(&format!(", {count} {label} errors"));
            }
        }
        line
    }

    /// Table of rows for terminal output.
    pub fn row_lines(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                let score = row.score.map(format_score).unwrap_or_else(|| "-".to_string());
                let mut line = format!(
                    "row {:>4}  {:<10} score {:<5} {}",
                    row.row,
                    row.status.to_string(),
                    score,
                    row.company.as_deref().unwrap_or("<unnamed>")
                );
                if row.notified {
                    line.push_str("  [alerted]");
                }
                if let Some(reason) = &row.failure {
                    line.push_str(&format!("  ({reason})"));
                }
                line
            })
            .collect()
    }
}

//! Typed failures for the triage components.
//!
//! Each variant maps to one handling policy in the pipeline: access failures
//! abort the run, inference failures fail the row, delivery failures are
//! logged and ignored.
use crate::record::RecordStatus;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    /// The spreadsheet could not be read or written.
    #[error("spreadsheet access failed: {0}")]
    Access(String),

    /// The model call failed or returned something unusable.
    #[error("inference failed: {0}")]
    Inference(String),

    /// The webhook rejected or never received the alert.
    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("ledger write failed: {0}")]
    Ledger(#[from] rusqlite::Error),

    #[error("cannot create ledger directory {}", .0.display())]
    LedgerDir(PathBuf, #[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("row {row}: cannot move from {from} to {to}")]
    Transition {
        row: u32,
        from: RecordStatus,
        to: RecordStatus,
    },
}

pub type Result<T> = std::result::Result<T, TriageError>;

/// Render a ureq failure with the HTTP status when there is one.
pub(crate) fn describe_http_error(err: &ureq::Error) -> String {
    match err {
        ureq::Error::StatusCode(code) => format!("HTTP status {code}"),
        ureq::Error::Timeout(_) => "request timed out".to_string(),
        other => other.to_string(),
    }
}

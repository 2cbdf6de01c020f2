//! Spreadsheet access: reading unprocessed rows and writing results back.
mod auth;
mod client;
mod grid;

pub use client::SheetsClient;

use crate::error::Result;
use crate::record::OpportunityRecord;

/// Source of rows that still need triage.
pub trait RowSource {
    /// Every row whose status is still blank. Any failure is an access error.
    fn fetch_unprocessed(&self) -> Result<Vec<OpportunityRecord>>;
}

/// Destination for per-row results.
pub trait SinkWriter {
    /// Write status, summary and score for one record back to its row.
    fn write_back(&self, record: &OpportunityRecord) -> Result<()>;
}

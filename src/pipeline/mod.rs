//! One triage pass: fetch, analyze, record, alert, write back.
//!
//! Only a failed fetch aborts the pass. Everything after that is per row:
//! an analysis failure fails the row, while ledger, delivery and write-back
//! failures are logged and counted without touching the row's status.
mod report;

pub use report::{RowOutcome, RunReport};

use crate::enrich::Enricher;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::notify::Notifier;
use crate::record::{OpportunityRecord, RecordStatus};
use crate::sheets::{RowSource, SinkWriter};
use chrono::Utc;
use std::time::Instant;

pub struct Pipeline<'a> {
    source: &'a dyn RowSource,
    enricher: &'a dyn Enricher,
    ledger: &'a mut dyn Ledger,
    notifier: &'a dyn Notifier,
    sink: &'a dyn SinkWriter,
    threshold: f64,
    limit: Option<usize>,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn RowSource,
        enricher: &'a dyn Enricher,
        ledger: &'a mut dyn Ledger,
        notifier: &'a dyn Notifier,
        sink: &'a dyn SinkWriter,
        threshold: f64,
    ) -> Self {
        Self {
            source,
            enricher,
            ledger,
            notifier,
            sink,
            threshold,
            limit: None,
        }
    }

    /// Process at most `limit` rows per pass; the rest wait for the next one.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Run one pass. Errors only when the sheet cannot be read.
    pub fn run(&mut self) -> Result<RunReport> {
        let started = Instant::now();
        let started_at = Utc::now().to_rfc3339();
        let mut records = self.source.fetch_unprocessed()?;
        let available = records.len();
        if let Some(limit) = self.limit {
            records.truncate(limit);
        }

        let mut report = RunReport {
            started_at,
            available,
            fetched: records.len(),
            ..RunReport::default()
        };
        if records.is_empty() {
            tracing::info!("no new inquiries to process");
        }
        for record in records {
            let outcome = self.process(record);
            report.push(outcome);
        }
        report.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            elapsed_ms = report.elapsed_ms,
            processed = report.processed,
            failed = report.failed,
            notified = report.notified,
            "pass complete"
        );
        Ok(report)
    }

    fn process(&mut self, mut record: OpportunityRecord) -> RowOutcome {
        let span = tracing::info_span!("row", row = record.row, company = %record.display_name());
        let _guard = span.enter();
        let mut outcome = RowOutcome::new(&record);

        let analyzed = match record.description_text() {
            None => Err("no opportunity description".to_string()),
            Some(text) => self.enricher.analyze(text).map_err(|e| e.to_string()),
        };
        let transition = match analyzed {
            Ok(analysis) => {
                tracing::info!(score = analysis.score, "analyzed");
                record.mark_processed(analysis)
            }
            Err(reason) => {
                tracing::warn!(%reason, "analysis failed");
                record.mark_failed(reason)
            }
        };
        if let Err(err) = transition {
            // Source handed over a row that was already terminal; leave it alone.
            tracing::error!(error = %err, "skipping row");
            outcome.failure = Some(err.to_string());
            return outcome;
        }

        if record.status == RecordStatus::Processed {
            let alert_due = record.score().is_some_and(|score| score >= self.threshold);
            outcome.alert_due = alert_due;
            match self.ledger.append(&record, alert_due) {
                Ok(id) => outcome.ledger_id = Some(id),
                Err(err) => {
                    tracing::warn!(error = %err, "ledger append failed");
                    outcome.ledger_error = Some(err.to_string());
                }
            }
            if alert_due {
                match self.notifier.notify(&record) {
                    Ok(()) => {
                        record.notification_sent = true;
                        tracing::info!(threshold = self.threshold, "alert sent");
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "alert not delivered");
                        outcome.delivery_error = Some(err.to_string());
                    }
                }
            }
        }

        if let Err(err) = self.sink.write_back(&record) {
            tracing::error!(error = %err, "write-back failed; row stays unmarked in the sheet");
            outcome.write_back_error = Some(err.to_string());
        }
        outcome.settle(&record);
        outcome
    }
}

//! Append-only SQLite ledger of triaged opportunities.
//!
//! Rows are only ever inserted. Nothing deduplicates on `source_row`, so
//! re-running over a row that was never marked in the sheet records it twice.
use crate::error::{Result, TriageError};
use crate::record::OpportunityRecord;
use chrono::Utc;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Audit store for processed records.
pub trait Ledger {
    /// Append a copy of `record`. `alert_due` records whether the score met
    /// the threshold at append time.
    fn append(&mut self, record: &OpportunityRecord, alert_due: bool) -> Result<i64>;
}

/// One stored ledger row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    pub id: i64,
    pub source_row: u32,
    pub timestamp: Option<String>,
    pub company_name: Option<String>,
    pub contact_email: Option<String>,
    pub company_website: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub ai_summary: Option<String>,
    pub alignment_score: Option<f64>,
    pub suggested_next_step: Option<String>,
    pub alert_due: bool,
    pub recorded_at: String,
}

#[derive(Debug)]
pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Open (creating if needed) the ledger database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| TriageError::LedgerDir(parent.to_path_buf(), e))?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Create the table and index if they do not exist yet.
    pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS opportunities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_row INTEGER NOT NULL,
                timestamp TEXT,
                company_name TEXT,
                contact_email TEXT,
                company_website TEXT,
                description TEXT,
                status TEXT NOT NULL,
                ai_summary TEXT,
                alignment_score REAL,
                suggested_next_step TEXT,
                alert_due INTEGER NOT NULL DEFAULT 0,
                recorded_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_opportunities_source_row ON opportunities(source_row)",
            [],
        )?;
        Ok(())
    }

    pub fn count(&self) -> Result<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM opportunities", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Most recent entries first.
    pub fn recent(&self, limit: usize) -> Result<Vec<LedgerRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_row, timestamp, company_name, contact_email, company_website,
                    description, status, ai_summary, alignment_score, suggested_next_step,
                    alert_due, recorded_at
             FROM opportunities
             ORDER BY id DESC
             LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(LedgerRow {
                    id: row.get(0)?,
                    source_row: row.get(1)?,
                    timestamp: row.get(2)?,
                    company_name: row.get(3)?,
                    contact_email: row.get(4)?,
                    company_website: row.get(5)?,
                    description: row.get(6)?,
                    status: row.get(7)?,
                    ai_summary: row.get(8)?,
                    alignment_score: row.get(9)?,
                    suggested_next_step: row.get(10)?,
                    alert_due: row.get(11)?,
                    recorded_at: row.get(12)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

impl Ledger for SqliteLedger {
    fn append(&mut self, record: &OpportunityRecord, alert_due: bool) -> Result<i64> {
        let analysis = record.analysis.as_ref();
        self.conn.execute(
            "INSERT INTO opportunities (
                source_row, timestamp, company_name, contact_email, company_website,
                description, status, ai_summary, alignment_score, suggested_next_step,
                alert_due, recorded_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.row,
                record.submitted_at,
                record.company_name,
                record.contact_email,
                record.company_website,
                record.description,
                record.status.as_cell(),
                analysis.map(|a| a.summary.as_str()),
                analysis.map(|a| a.score),
                analysis.and_then(|a| a.next_step.as_deref()),
                alert_due,
                Utc::now().to_rfc3339(),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(id, row = record.row, "ledger append");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Analysis;

    fn processed(row: u32, score: f64) -> OpportunityRecord {
        let mut record = OpportunityRecord::unprocessed(row);
        record.company_name = Some(format!("Company {row}"));
        record.description = Some("B2B SaaS company in Pakistan".to_string());
        record
            .mark_processed(Analysis {
                summary: "Vertical SaaS".to_string(),
                score,
                next_step: Some("Schedule initial screening call".to_string()),
            })
            .unwrap();
        record
    }

    #[test]
    fn append_and_read_back() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        let id = ledger.append(&processed(2, 4.0), true).unwrap();
        assert_eq!(id, 1);

        let rows = ledger.recent(10).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.source_row, 2);
        assert_eq!(row.status, "Processed");
        assert_eq!(row.ai_summary.as_deref(), Some("Vertical SaaS"));
        assert_eq!(row.alignment_score, Some(4.0));
        assert!(row.alert_due);
        assert!(!row.recorded_at.is_empty());
    }

    #[test]
    fn duplicate_rows_are_not_deduplicated() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        ledger.append(&processed(5, 2.0), false).unwrap();
        ledger.append(&processed(5, 2.0), false).unwrap();
        assert_eq!(ledger.count().unwrap(), 2);
    }

    #[test]
    fn recent_is_newest_first_and_limited() {
        let mut ledger = SqliteLedger::open_in_memory().unwrap();
        for row in 2..6 {
            ledger.append(&processed(row, 3.0), false).unwrap();
        }
        let rows = ledger.recent(2).unwrap();
        assert_eq!(
            rows.iter().map(|r| r.source_row).collect::<Vec<_>>(),
            vec![5, 4]
        );
    }

    #[test]
    fn file_ledger_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("opportunities.db");
        {
            let mut ledger = SqliteLedger::open(&path).unwrap();
            ledger.append(&processed(2, 4.0), true).unwrap();
        }
        let ledger = SqliteLedger::open(&path).unwrap();
        assert_eq!(ledger.count().unwrap(), 1);
    }

    #[test]
    fn uncreatable_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("data");
        fs::write(&blocker, "not a directory").unwrap();
        let err = SqliteLedger::open(&blocker.join("opportunities.db")).unwrap_err();
        match err {
            TriageError::LedgerDir(path, _) => assert_eq!(path, blocker),
            other => panic!("expected ledger directory error, got {other:?}"),
        }
    }
}

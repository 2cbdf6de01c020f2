//! The opportunity record and its status lifecycle.
use crate::error::{Result, TriageError};
use serde::{Deserialize, Serialize};

/// Processing status as stored in the sheet's Status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Unprocessed,
    Processed,
    Failed,
}

impl RecordStatus {
    /// Cell text written back to the sheet. Unprocessed is an empty cell.
    pub fn as_cell(&self) -> &'static str {
        match self {
            Self::Unprocessed => "",
            Self::Processed => "Processed",
            Self::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Unprocessed)
    }
}

impl std::fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unprocessed => write!(f, "unprocessed"),
            Self::Processed => write!(f, "processed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Human-readable score: `4` for whole numbers, `4.5` otherwise.
pub fn format_score(score: f64) -> String {
    if score.fract().abs() < f64::EPSILON {
        format!("{score:.0}")
    } else {
        format!("{}", (score * 100.0).round() / 100.0)
    }
}

/// Model output for one description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub summary: String,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
}

/// One form submission plus whatever the pipeline derived for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    /// 1-based sheet row number; doubles as the record identifier.
    pub row: u32,
    pub submitted_at: Option<String>,
    pub company_name: Option<String>,
    pub contact_email: Option<String>,
    pub company_website: Option<String>,
    pub description: Option<String>,
    pub status: RecordStatus,
    pub analysis: Option<Analysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub notification_sent: bool,
}

impl OpportunityRecord {
    /// A fresh record as read from the sheet.
    pub fn unprocessed(row: u32) -> Self {
        Self {
            row,
            submitted_at: None,
            company_name: None,
            contact_email: None,
            company_website: None,
            description: None,
            status: RecordStatus::Unprocessed,
            analysis: None,
            failure: None,
            notification_sent: false,
        }
    }

    /// Label used in logs and alerts.
    pub fn display_name(&self) -> &str {
        self.company_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("<unnamed>")
    }

    /// Description text if it carries anything besides whitespace.
    pub fn description_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    pub fn score(&self) -> Option<f64> {
        self.analysis.as_ref().map(|analysis| analysis.score)
    }

    /// Record a successful analysis and move to `Processed`.
    pub fn mark_processed(&mut self, analysis: Analysis) -> Result<()> {
        self.transition(RecordStatus::Processed)?;
        self.analysis = Some(analysis);
        Ok(())
    }

    /// Record why the row could not be analyzed and move to `Failed`.
    pub fn mark_failed(&mut self, reason: impl Into<String>) -> Result<()> {
        self.transition(RecordStatus::Failed)?;
        self.failure = Some(reason.into());
        Ok(())
    }

    fn transition(&mut self, to: RecordStatus) -> Result<()> {
        if self.status.is_terminal() {
            return Err(TriageError::Transition {
                row: self.row,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

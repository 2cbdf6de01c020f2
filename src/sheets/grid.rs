//! Mapping between the raw values grid and opportunity records.
//!
//! The first row is the header. Columns are located by header name
//! (trimmed, case-insensitive), so reordering columns in the sheet does not
//! break the mapping.
use crate::config::ColumnNames;
use crate::error::{Result, TriageError};
use crate::record::OpportunityRecord;
use serde_json::Value;

/// Column positions (0-based) resolved from the header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub timestamp: Option<usize>,
    pub company_name: Option<usize>,
    pub contact_email: Option<usize>,
    pub company_website: Option<usize>,
    pub description: Option<usize>,
    pub status: usize,
    pub summary: usize,
    pub score: usize,
}

impl SheetLayout {
    /// Resolve positions from a header row.
    ///
    /// Status is mandatory. A missing summary or score header takes the
    /// next column past the last non-empty header cell, so output never
    /// lands on a column the form already uses.
    pub fn from_header(header: &[String], columns: &ColumnNames) -> Result<Self> {
        let find = |name: &str| {
            let wanted = name.trim();
            header
                .iter()
                .position(|cell| cell.trim().eq_ignore_ascii_case(wanted))
        };
        let status = find(&columns.status).ok_or_else(|| {
            TriageError::Access(format!(
                "header row has no {:?} column",
                columns.status.trim()
            ))
        })?;
        let mut next_free = header
            .iter()
            .rposition(|cell| !cell.trim().is_empty())
            .map_or(0, |last| last + 1);
        let mut claim_free = || {
            let column = next_free;
            next_free += 1;
            column
        };
        let summary = find(&columns.summary).unwrap_or_else(&mut claim_free);
        let score = find(&columns.score).unwrap_or_else(&mut claim_free);
        Ok(Self {
            timestamp: find(&columns.timestamp),
            company_name: find(&columns.company_name),
            contact_email: find(&columns.contact_email),
            company_website: find(&columns.company_website),
            description: find(&columns.description),
            status,
            summary,
            score,
        })
    }
}

/// Render a JSON cell as text. The API sends formatted strings, but numbers
/// and booleans show up when a different render option is used.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Convert a values grid into the rows whose Status cell is blank.
pub fn unprocessed_records(
    values: &[Vec<Value>],
    columns: &ColumnNames,
) -> Result<(SheetLayout, Vec<OpportunityRecord>)> {
    let Some((header, rows)) = values.split_first() else {
        return Err(TriageError::Access("sheet has no header row".to_string()));
    };
    let header: Vec<String> = header.iter().map(cell_text).collect();
    let layout = SheetLayout::from_header(&header, columns)?;

    let mut records = Vec::new();
    for (offset, row) in rows.iter().enumerate() {
        // The API drops trailing empty cells, so short rows read as blank.
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| row.get(i))
                .map(cell_text)
                .filter(|text| !text.trim().is_empty())
        };
        if cell(Some(layout.status)).is_some() {
            continue;
        }
        if row.iter().all(|value| cell_text(value).trim().is_empty()) {
            continue;
        }
        // Header is row 1 and sheet rows are 1-based.
        let row_number = u32::try_from(offset + 2)
            .map_err(|_| TriageError::Access(format!("row index {offset} out of range")))?;
        let mut record = OpportunityRecord::unprocessed(row_number);
        record.submitted_at = cell(layout.timestamp);
        record.company_name = cell(layout.company_name);
        record.contact_email = cell(layout.contact_email);
        record.company_website = cell(layout.company_website);
        record.description = cell(layout.description);
        records.push(record);
    }
    Ok((layout, records))
}

/// Convert a 0-based column index to A1 letters (0 -> A, 26 -> AA).
pub fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Quote a sheet name for A1 notation.
pub fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// A1 reference for a single cell.
pub fn cell_range(sheet_name: &str, column: usize, row: u32) -> String {
    format!(
        "{}!{}{}",
        quote_sheet_name(sheet_name),
        column_letters(column),
        row
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grid(value: Value) -> Vec<Vec<Value>> {
        serde_json::from_value(value).expect("grid")
    }

    fn form_header() -> Value {
        json!([
            "Timestamp",
            "Company Name",
            "Contact Email",
            "Company Website",
            "Opportunity Description",
            "Status",
            "AI Summary",
            "Alignment Score"
        ])
    }

    #[test]
    fn picks_rows_with_blank_status() {
        let values = grid(json!([
            form_header(),
            ["1/2/2025", "Acme", "a@acme.pk", "acme.pk", "B2B SaaS for clinics", "Processed", "x", "4"],
            ["1/3/2025", "Beta", "b@beta.io", "", "Fintech ledger API"],
            ["1/4/2025", "Gamma", "", "", "Agritech marketplace", "  "]
        ]));
        let (layout, records) = unprocessed_records(&values, &ColumnNames::default()).unwrap();
        assert_eq!(layout.status, 5);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].row, 3);
        assert_eq!(records[0].company_name.as_deref(), Some("Beta"));
        assert_eq!(records[0].company_website, None);
        assert_eq!(records[0].description.as_deref(), Some("Fintech ledger API"));

        assert_eq!(records[1].row, 4);
        assert_eq!(records[1].contact_email, None);
    }

    #[test]
    fn header_only_sheet_is_empty() {
        let values = grid(json!([form_header()]));
        let (_, records) = unprocessed_records(&values, &ColumnNames::default()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn fully_blank_rows_are_skipped() {
        let values = grid(json!([form_header(), [], ["", ""], ["t", "Delta"]]));
        let (_, records) = unprocessed_records(&values, &ColumnNames::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].row, 4);
    }

    #[test]
    fn missing_status_header_is_access_error() {
        let values = grid(json!([["Timestamp", "Company Name"], ["t", "Acme"]]));
        let err = unprocessed_records(&values, &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, TriageError::Access(_)));
    }

    #[test]
    fn empty_grid_is_access_error() {
        let err = unprocessed_records(&[], &ColumnNames::default()).unwrap_err();
        assert!(matches!(err, TriageError::Access(_)));
    }

    #[test]
    fn layout_matches_case_insensitively_and_defaults_outputs() {
        let header: Vec<String> = ["opportunity description", " STATUS ", "Notes"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let layout = SheetLayout::from_header(&header, &ColumnNames::default()).unwrap();
        assert_eq!(layout.description, Some(0));
        assert_eq!(layout.status, 1);
        // "Notes" belongs to the user; outputs go past it.
        assert_eq!(layout.summary, 3);
        assert_eq!(layout.score, 4);
        assert_eq!(layout.company_name, None);
    }

    #[test]
    fn missing_summary_header_does_not_share_the_score_column() {
        let header: Vec<String> = ["Opportunity Description", "Status", "Alignment Score"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let layout = SheetLayout::from_header(&header, &ColumnNames::default()).unwrap();
        assert_eq!(layout.score, 2);
        assert_eq!(layout.summary, 3);
        assert_ne!(layout.summary, layout.score);
    }

    #[test]
    fn trailing_blank_header_cells_are_reused() {
        let header: Vec<String> = ["Status", "", " "].iter().map(|s| s.to_string()).collect();
        let layout = SheetLayout::from_header(&header, &ColumnNames::default()).unwrap();
        assert_eq!((layout.summary, layout.score), (1, 2));
    }

    #[test]
    fn numeric_cells_render_as_text() {
        assert_eq!(cell_text(&json!(4)), "4");
        assert_eq!(cell_text(&json!(null)), "");
        assert_eq!(cell_text(&json!("x")), "x");
    }

    #[test]
    fn column_letters_roll_over() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(5), "F");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn sheet_names_are_quoted() {
        assert_eq!(cell_range("Form Responses 1", 5, 2), "'Form Responses 1'!F2");
        assert_eq!(quote_sheet_name("Bob's leads"), "'Bob''s leads'");
    }
}

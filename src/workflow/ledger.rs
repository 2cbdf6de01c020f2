//! `triage ledger`: print recent ledger entries.
use super::context::TriageContext;
use crate::cli::{LedgerArgs, OverrideArgs};
use crate::ledger::SqliteLedger;
use crate::record::format_score;
use anyhow::{Context, Result};
use std::path::Path;

pub fn run_ledger(config: Option<&Path>, args: &LedgerArgs) -> Result<()> {
    let ctx = TriageContext::load(config, &OverrideArgs::default())?;
    let path = ctx.ledger_path();
    let ledger =
        SqliteLedger::open(&path).with_context(|| format!("open ledger {}", path.display()))?;
    let rows = ledger.recent(args.limit)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).context("render ledger entries")?
        );
        return Ok(());
    }
    if rows.is_empty() {
        println!("ledger is empty");
        return Ok(());
    }
    for row in &rows {
        let score = row
            .alignment_score
            .map(format_score)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "#{:<5} row {:>4}  {:<25}  score {:<5}{}  {}",
            row.id,
            row.source_row,
            row.recorded_at,
            score,
            if row.alert_due { " !" } else { "  " },
            row.company_name.as_deref().unwrap_or("<unnamed>")
        );
    }
    println!("{} of {} entries", rows.len(), ledger.count()?);
    Ok(())
}

//! `triage run`: one pass over the sheet, or a pass every N seconds.
use super::context::TriageContext;
use crate::cli::RunArgs;
use crate::enrich::{build_enricher, Enricher};
use crate::http::build_agent;
use crate::ledger::SqliteLedger;
use crate::notify::SlackNotifier;
use crate::pipeline::{Pipeline, RunReport};
use crate::sheets::SheetsClient;
use anyhow::{Context, Result};
use std::path::Path;
use std::thread;
use std::time::Duration;

pub fn run_run(config: Option<&Path>, args: &RunArgs) -> Result<()> {
    let ctx = TriageContext::load_validated(config, &args.overrides)?;
    let config = &ctx.config;
    let agent = build_agent(config.timeout_secs);
    let enricher = build_enricher(agent.clone(), &config.inference)
        .context("set up inference backend")?;
    let notifier = SlackNotifier::new(
        agent.clone(),
        config.notify.webhook_url.as_deref(),
        config.inference.score_scale_max,
    )?;
    let ledger_path = ctx.ledger_path();
    let mut ledger = SqliteLedger::open(&ledger_path)
        .with_context(|| format!("open ledger {}", ledger_path.display()))?;
    let mut components = Components {
        ctx: &ctx,
        agent,
        enricher: enricher.as_ref(),
        notifier: &notifier,
        ledger: &mut ledger,
        limit: args.limit,
    };

    let Some(every) = args.every else {
        let report = components.pass()?;
        return emit(&report, args.json, false);
    };

    tracing::info!(every_secs = every, "polling");
    poll(
        Duration::from_secs(every),
        None,
        || components.pass(),
        |report| emit(report, args.json, true),
    )
}

/// Run `pass` every `interval` until `max_passes` is reached (forever when
/// `None`). A failed pass is logged and the loop carries on; only an error
/// from `on_report` stops it.
fn poll<P, E>(
    interval: Duration,
    max_passes: Option<usize>,
    mut pass: P,
    mut on_report: E,
) -> Result<()>
where
    P: FnMut() -> Result<RunReport>,
    E: FnMut(&RunReport) -> Result<()>,
{
    let mut passes = 0usize;
    loop {
        match pass() {
            Ok(report) => on_report(&report)?,
            Err(err) => tracing::error!(error = %format!("{err:#}"), "pass failed"),
        }
        passes += 1;
        if max_passes.is_some_and(|max| passes >= max) {
            return Ok(());
        }
        thread::sleep(interval);
    }
}

struct Components<'a> {
    ctx: &'a TriageContext,
    agent: ureq::Agent,
    enricher: &'a dyn Enricher,
    notifier: &'a SlackNotifier,
    ledger: &'a mut SqliteLedger,
    limit: Option<usize>,
}

impl Components<'_> {
    /// The sheets client is rebuilt per pass so a token command mints a
    /// fresh token each time.
    fn pass(&mut self) -> Result<RunReport> {
        let config = &self.ctx.config;
        let sheets = SheetsClient::from_config(self.agent.clone(), &config.sheets)
            .context("set up sheets client")?;
        let report = Pipeline::new(
            &sheets,
            self.enricher,
            &mut *self.ledger,
            self.notifier,
            &sheets,
            config.notify.threshold,
        )
        .with_limit(self.limit)
        .run()
        .context("triage pass aborted")?;
        Ok(report)
    }
}

fn emit(report: &RunReport, json: bool, streaming: bool) -> Result<()> {
    if json {
        let text = if streaming {
            serde_json::to_string(report)
        } else {
            serde_json::to_string_pretty(report)
        }
        .context("render run report")?;
        println!("{text}");
        return Ok(());
    }
    for line in report.row_lines() {
        println!("{line}");
    }
    println!("{}", report.summary_line());
    Ok(())
}

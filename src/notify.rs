//! High-score alerts posted to a Slack incoming webhook.
use crate::error::{describe_http_error, Result, TriageError};
use crate::record::{format_score, OpportunityRecord};
use serde_json::{json, Value};

/// Delivers an alert for one record.
pub trait Notifier {
    /// Failures are delivery errors; the caller logs and moves on.
    fn notify(&self, record: &OpportunityRecord) -> Result<()>;
}

pub struct SlackNotifier {
    agent: ureq::Agent,
    webhook_url: String,
    scale_max: f64,
}

impl SlackNotifier {
    pub fn new(agent: ureq::Agent, webhook_url: Option<&str>, scale_max: f64) -> Result<Self> {
        let webhook_url = webhook_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| TriageError::Config("notify.webhook_url is not set".to_string()))?
            .to_string();
        Ok(Self {
            agent,
            webhook_url,
            scale_max,
        })
    }
}

impl Notifier for SlackNotifier {
    fn notify(&self, record: &OpportunityRecord) -> Result<()> {
        let payload = alert_payload(record, self.scale_max);
        let mut response = self
            .agent
            .post(&self.webhook_url)
            .send_json(&payload)
            .map_err(|e| TriageError::Delivery(describe_http_error(&e)))?;
        let body = response.body_mut().read_to_string().unwrap_or_default();
        tracing::debug!(row = record.row, response = %body.trim(), "alert posted");
        Ok(())
    }
}

/// Block Kit message for a high-priority opportunity.
pub fn alert_payload(record: &OpportunityRecord, scale_max: f64) -> Value {
    let name = record.display_name();
    let score = record
        .score()
        .map(|score| format!("{}/{}", format_score(score), format_score(scale_max)))
        .unwrap_or_else(|| "n/a".to_string());
    let contact = record.contact_email.as_deref().unwrap_or("n/a");
    let analysis = record.analysis.as_ref();
    let summary = analysis.map_or("n/a", |a| a.summary.as_str());
    let next_step = analysis
        .and_then(|a| a.next_step.as_deref())
        .unwrap_or("n/a");

    let mut fields = vec![
        json!({"type": "mrkdwn", "text": format!("*Alignment Score:*\n{score}")}),
        json!({"type": "mrkdwn", "text": format!("*Contact:*\n{contact}")}),
    ];
    if let Some(website) = record.company_website.as_deref() {
        fields.push(json!({"type": "mrkdwn", "text": format!("*Website:*\n{website}")}));
    }

    json!({
        "text": format!("High-Priority Opportunity: *{name}* (Score: {score})"),
        "blocks": [
            {
                "type": "section",
                "text": {"type": "mrkdwn", "text": format!(":rocket: *High-Priority Opportunity: {name}*")}
            },
            {"type": "section", "fields": fields},
            {
                "type": "section",
                "text": {"type": "mrkdwn", "text": format!("*Summary:*\n{summary}")}
            },
            {
                "type": "section",
                "text": {"type": "mrkdwn", "text": format!("*Suggested Next Step:*\n>{next_step}")}
            }
        ]
    })
}

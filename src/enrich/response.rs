//! Parsing model answers into an `Analysis`.
//!
//! Models wrap JSON in markdown fences or prose often enough that the raw
//! text is cleaned before parsing. Scores arrive as numbers, numeric strings,
//! or fractions like `"4/5"`.
use crate::error::{Result, TriageError};
use crate::record::Analysis;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

const SNIPPET_CHARS: usize = 300;

#[derive(Debug, Deserialize)]
struct ModelAnswer {
    summary: String,
    alignment_score: ScoreField,
    #[serde(default)]
    suggested_next_step: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScoreField {
    Number(f64),
    Text(String),
}

fn leading_number() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+(?:\.\d+)?)").expect("score regex is valid"))
}

/// Parse a model answer and check the score against `0..=scale_max`.
pub fn parse_analysis(text: &str, scale_max: f64) -> Result<Analysis> {
    let json_text = extract_json(text);
    let answer: ModelAnswer = serde_json::from_str(json_text).map_err(|e| {
        TriageError::Inference(format!(
            "parse model answer: {e} (response starts: {})",
            snippet(text)
        ))
    })?;

    let score = match answer.alignment_score {
        ScoreField::Number(value) => value,
        ScoreField::Text(raw) => leading_number()
            .captures(&raw)
            .and_then(|caps| caps[1].parse::<f64>().ok())
            .ok_or_else(|| {
                TriageError::Inference(format!("alignment_score is not numeric: {raw:?}"))
            })?,
    };
    if !(0.0..=scale_max).contains(&score) {
        return Err(TriageError::Inference(format!(
            "alignment_score {score} outside 0..={scale_max}"
        )));
    }

    let summary = answer.summary.trim().to_string();
    if summary.is_empty() {
        return Err(TriageError::Inference("summary is empty".to_string()));
    }

    Ok(Analysis {
        summary,
        score,
        next_step: answer
            .suggested_next_step
            .map(|step| step.trim().to_string())
            .filter(|step| !step.is_empty()),
    })
}

/// Extract JSON from text that might have markdown code fences or prose.
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let start = start + 3;
        // Skip language identifier if present
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            return text[start..start + end].trim();
        }
    }

    // Prose around a bare object: keep the outermost braces.
    if let (Some(open), Some(close)) = (text.find('{'), text.rfind('}')) {
        if open < close {
            return &text[open..=close];
        }
    }

    text
}

fn snippet(text: &str) -> String {
    let mut out: String = text.chars().take(SNIPPET_CHARS).collect();
    if text.chars().count() > SNIPPET_CHARS {
        out.push_str("...");
    }
    out
}

//! Hosted Gemini backend (`models/{model}:generateContent`).
use super::prompt::build_prompt;
use super::response::parse_analysis;
use super::Enricher;
use crate::config::InferenceConfig;
use crate::error::{describe_http_error, Result, TriageError};
use crate::http::join_url;
use crate::record::Analysis;
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

pub struct GeminiClient {
    agent: ureq::Agent,
    api_base: String,
    model: String,
    api_key: String,
    thesis: String,
    scale_max: f64,
}

impl GeminiClient {
    pub fn new(agent: ureq::Agent, config: &InferenceConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TriageError::Config("inference.api_key is not set".to_string()))?;
        Ok(Self {
            agent,
            api_base: config.api_base.clone(),
            model: config.model.clone(),
            api_key,
            thesis: config.thesis.clone(),
            scale_max: config.score_scale_max,
        })
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        let url = join_url(
            &self.api_base,
            &format!("models/{}:generateContent", self.model),
        );
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {"responseMimeType": "application/json"},
        });

        let start = Instant::now();
        let mut response = self
            .agent
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .send_json(&body)
            .map_err(|e| TriageError::Inference(describe_http_error(&e)))?;
        let payload: GenerateResponse = response
            .body_mut()
            .read_json()
            .map_err(|e| TriageError::Inference(format!("decode generateContent response: {e}")))?;

        let candidate = payload
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| TriageError::Inference("response has no candidates".to_string()))?;
        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(TriageError::Inference(format!(
                "empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        tracing::info!(
            model = %self.model,
            elapsed_ms = start.elapsed().as_millis(),
            prompt_bytes = prompt.len(),
            response_bytes = text.len(),
            "lm invoke complete"
        );
        Ok(text)
    }
}

impl Enricher for GeminiClient {
    fn analyze(&self, text: &str) -> Result<Analysis> {
        let prompt = build_prompt(&self.thesis, text, self.scale_max);
        let answer = self.generate(&prompt)?;
        parse_analysis(&answer, self.scale_max)
    }
}

//! Local LM command backend.
//!
//! Runs a user-configured command (e.g. `llm -m gemini-flash`, `ollama run
//! llama3`) with the prompt on stdin and parses its stdout as the answer.
use super::prompt::build_prompt;
use super::response::parse_analysis;
use super::Enricher;
use crate::config::InferenceConfig;
use crate::error::{Result, TriageError};
use crate::process::run_command;
use crate::record::Analysis;
use std::time::Instant;

pub struct CommandEnricher {
    command: String,
    thesis: String,
    scale_max: f64,
}

impl CommandEnricher {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let command = config
            .command
            .clone()
            .filter(|command| !command.trim().is_empty())
            .ok_or_else(|| TriageError::Config("inference.command is not set".to_string()))?;
        Ok(Self {
            command,
            thesis: config.thesis.clone(),
            scale_max: config.score_scale_max,
        })
    }
}

impl Enricher for CommandEnricher {
    fn analyze(&self, text: &str) -> Result<Analysis> {
        let prompt = build_prompt(&self.thesis, text, self.scale_max);
        let start = Instant::now();
        let answer = run_command(&self.command, Some(&prompt))
            .map_err(|e| TriageError::Inference(format!("{e:#}")))?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis(),
            prompt_bytes = prompt.len(),
            response_bytes = answer.len(),
            "lm invoke complete"
        );
        parse_analysis(&answer, self.scale_max)
    }
}

//! Scoring descriptions with a language model.
mod command;
mod gemini;
mod prompt;
mod response;

pub use command::CommandEnricher;
pub use gemini::GeminiClient;

use crate::config::{InferenceBackend, InferenceConfig};
use crate::error::Result;
use crate::record::Analysis;

/// Turns a free-text description into a summary and alignment score.
pub trait Enricher {
    /// Any failure (transport, timeout, unusable answer) is an inference error.
    fn analyze(&self, text: &str) -> Result<Analysis>;
}

/// Build the backend selected in config.
pub fn build_enricher(agent: ureq::Agent, config: &InferenceConfig) -> Result<Box<dyn Enricher>> {
    Ok(match config.backend {
        InferenceBackend::Gemini => Box::new(GeminiClient::new(agent, config)?),
        InferenceBackend::Command => Box::new(CommandEnricher::new(config)?),
    })
}

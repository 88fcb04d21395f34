//! Summarizer provider implementations

pub mod local;
pub mod openai;

use anyhow::{Context, Result};
use specgraph_core::config::EnrichmentConfig;

use super::bridge::Summarizer;

/// Factory function to create the configured summarizer
pub fn create_summarizer(config: &EnrichmentConfig) -> Result<Box<dyn Summarizer>> {
    match config.provider.as_str() {
        "openai" => {
            let api_key = std::env::var(&config.api_key_env).with_context(|| {
                format!("{} is not set (needed by the openai provider)", config.api_key_env)
            })?;
            Ok(Box::new(
                openai::OpenAISummarizer::new(api_key)
                    .with_model(config.model.clone())
                    .with_endpoint(config.endpoint.clone())
                    .with_max_tokens(config.max_tokens_per_request),
            ))
        }
        "local" => Ok(Box::new(local::LocalSummarizer::new())),
        other => anyhow::bail!("Unknown summarizer provider: {}", other),
    }
}

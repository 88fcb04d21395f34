//! OpenAI-compatible chat completions provider

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::super::bridge::{ExplainRequest, Summarizer, Summary, SummaryRequest};
use super::super::prompt::{
    explain_prompt, summary_prompt, EXPLAIN_SYSTEM_PROMPT, SUMMARY_SYSTEM_PROMPT,
};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Explanations cover a section plus its impact list, so they get a larger cap.
const EXPLAIN_MAX_TOKENS: u32 = 500;

pub struct OpenAISummarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
    max_tokens: u32,
}

impl OpenAISummarizer {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: "gpt-4o-mini".to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_tokens: 300,
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Completion cap for summary requests.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    async fn complete(&self, system: &str, prompt: String, max_tokens: u32) -> Result<Summary> {
        let request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
            temperature: 0.2,
            max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        let response: OpenAIResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .context("OpenAI response has no choices")?;

        Ok(Summary {
            text: choice.message.content.trim().to_string(),
            tokens_used: response.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: u32,
}

#[async_trait::async_trait]
impl Summarizer for OpenAISummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<Summary> {
        self.complete(SUMMARY_SYSTEM_PROMPT, summary_prompt(request), self.max_tokens)
            .await
            .with_context(|| format!("summarizing section {}", request.id))
    }

    async fn explain(&self, request: &ExplainRequest) -> Result<Summary> {
        self.complete(EXPLAIN_SYSTEM_PROMPT, explain_prompt(request), EXPLAIN_MAX_TOKENS)
            .await
            .with_context(|| format!("explaining section {}", request.section.id))
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

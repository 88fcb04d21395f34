//! Offline heuristic summarizer

use anyhow::Result;
use specgraph_core::search::highlight::truncate_snippet;
use specgraph_core::section::normalize_text;
use specgraph_core::ChangeType;

use super::super::bridge::{ExplainRequest, Summarizer, Summary, SummaryRequest};

/// Longest lead sentence kept in a heuristic summary, in characters.
const LEAD_CHARS: usize = 200;

#[derive(Debug, Default)]
pub struct LocalSummarizer;

impl LocalSummarizer {
    pub fn new() -> Self {
        Self
    }
}

/// First sentence of the text, whitespace-normalized and capped.
fn lead_sentence(text: &str) -> Option<String> {
    let text = normalize_text(text);
    if text.is_empty() {
        return None;
    }
    let end = text
        .find(". ")
        .map(|i| i + 1)
        .unwrap_or(text.len());
    Some(truncate_snippet(&text[..end], LEAD_CHARS))
}

fn status_line(request: &SummaryRequest) -> String {
    let verb = match request.change_type {
        ChangeType::Added => "Added",
        ChangeType::Removed => "Removed",
        ChangeType::Modified => "Modified",
        ChangeType::Unchanged => "Unchanged",
    };
    let mut line = format!("{} section {} ({}).", verb, request.id, request.title);
    if let Some(counterpart) = &request.counterpart {
        line.push_str(&format!(" Renumbered counterpart: {counterpart}."));
    }
    line
}

#[async_trait::async_trait]
impl Summarizer for LocalSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<Summary> {
        let text = match lead_sentence(&request.text) {
            Some(lead) => format!("{} {}", status_line(request), lead),
            None => format!("{} The section has no text.", status_line(request)),
        };
        Ok(Summary {
            text,
            tokens_used: 0,
        })
    }

    async fn explain(&self, request: &ExplainRequest) -> Result<Summary> {
        let mut text = status_line(&request.section);
        if request.impacted.is_empty() {
            text.push_str(" No other section is directly affected.");
        } else {
            let ids: Vec<&str> = request.impacted.iter().map(|s| s.id.as_str()).collect();
            text.push_str(&format!(
                " Directly affected sections ({}): {}.",
                ids.len(),
                ids.join(", ")
            ));
        }
        Ok(Summary {
            text,
            tokens_used: 0,
        })
    }

    fn name(&self) -> &str {
        "Local (Heuristic)"
    }
}

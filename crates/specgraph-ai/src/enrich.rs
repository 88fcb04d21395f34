//! Batch enrichment: attach a summary to every candidate node

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use dashmap::DashMap;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use specgraph_core::config::EnrichmentConfig;
use specgraph_core::{ChangeType, Graph, SectionId};

use super::bridge::{Summarizer, SummaryRequest};
use super::budget::Budget;
use super::prompt::summary_prompt;

/// Batch settings, usually taken from the `[enrichment]` config section.
#[derive(Debug, Clone)]
pub struct EnrichmentOptions {
    /// Attempts per node after the first failure.
    pub max_retries: u32,
    /// Backoff unit; attempt `n` waits `n * retry_delay`.
    pub retry_delay: Duration,
    pub concurrency: usize,
    pub changed_only: bool,
    pub token_budget: u32,
    /// Completion cap reserved from the budget for every attempt.
    pub max_tokens_per_request: u32,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self::from(&EnrichmentConfig::default())
    }
}

impl From<&EnrichmentConfig> for EnrichmentOptions {
    fn from(config: &EnrichmentConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            concurrency: config.concurrency,
            changed_only: config.changed_only,
            token_budget: config.token_budget,
            max_tokens_per_request: config.max_tokens_per_request,
        }
    }
}

/// Per-batch counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichReport {
    pub candidates: usize,
    pub summarized: usize,
    pub failed: usize,
    /// Not attempted because the token budget ran out.
    pub skipped: usize,
    pub tokens_used: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Summarized,
    Failed,
    Skipped,
}

/// Summarize candidate nodes and attach the results to `graph`.
///
/// Individual failures never abort the batch: a node that still fails after its retries
/// simply stays without a summary. An attempt is only issued when its estimated cost fits
/// the remaining token budget. Summaries are applied after all requests finish.
pub async fn enrich_graph(
    graph: &mut Graph,
    summarizer: &dyn Summarizer,
    options: &EnrichmentOptions,
) -> EnrichReport {
    let requests: Vec<SummaryRequest> = graph
        .nodes()
        .filter(|n| !options.changed_only || n.change_type != ChangeType::Unchanged)
        .map(|n| SummaryRequest::from_node(graph, n))
        .collect();

    tracing::info!(
        "Enriching {} sections with {} (concurrency {}, budget {} tokens)",
        requests.len(),
        summarizer.name(),
        options.concurrency,
        options.token_budget
    );

    let budget = Mutex::new(Budget::new(
        options.token_budget,
        options.max_tokens_per_request,
    ));
    let results: DashMap<SectionId, String> = DashMap::new();

    let outcomes: Vec<Outcome> = stream::iter(requests.iter())
        .map(|request| summarize_node(summarizer, request, options, &budget, &results))
        .buffer_unordered(options.concurrency.max(1))
        .collect()
        .await;

    let budget = budget.into_inner().unwrap_or_else(PoisonError::into_inner);
    let mut report = EnrichReport {
        candidates: requests.len(),
        tokens_used: budget.tokens_used,
        ..EnrichReport::default()
    };
    for outcome in outcomes {
        match outcome {
            Outcome::Summarized => report.summarized += 1,
            Outcome::Failed => report.failed += 1,
            Outcome::Skipped => report.skipped += 1,
        }
    }

    for (id, summary) in results {
        if !graph.set_summary(id.as_str(), summary) {
            tracing::warn!("Section {} disappeared before its summary was applied", id);
        }
    }

    if report.skipped > 0 {
        tracing::warn!(
            "Token budget exhausted ({} of {} tokens left), {} sections skipped",
            budget.remaining(),
            budget.total_tokens,
            report.skipped
        );
    }
    tracing::info!(
        "Enrichment finished: {} summarized, {} failed, {} skipped, {} tokens",
        report.summarized,
        report.failed,
        report.skipped,
        report.tokens_used
    );
    report
}

async fn summarize_node(
    summarizer: &dyn Summarizer,
    request: &SummaryRequest,
    options: &EnrichmentOptions,
    budget: &Mutex<Budget>,
    results: &DashMap<SectionId, String>,
) -> Outcome {
    let prompt_chars = summary_prompt(request).chars().count();
    for attempt in 0..=options.max_retries {
        if attempt > 0 {
            tokio::time::sleep(options.retry_delay * attempt).await;
        }
        {
            let guard = budget.lock().unwrap_or_else(PoisonError::into_inner);
            let estimate = guard.estimate_request(prompt_chars);
            if !guard.has_budget(estimate) {
                tracing::debug!(
                    "Skipping section {}: needs ~{} tokens, {} left",
                    request.id,
                    estimate,
                    guard.remaining()
                );
                return Outcome::Skipped;
            }
        }

        match summarizer.summarize(request).await {
            Ok(summary) if !summary.text.trim().is_empty() => {
                budget
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .use_tokens(summary.tokens_used);
                results.insert(request.id.clone(), summary.text.trim().to_string());
                return Outcome::Summarized;
            }
            Ok(_) => {
                tracing::warn!(
                    "Empty summary for section {} (attempt {}/{})",
                    request.id,
                    attempt + 1,
                    options.max_retries + 1
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Summarizing section {} failed (attempt {}/{}): {:#}",
                    request.id,
                    attempt + 1,
                    options.max_retries + 1,
                    e
                );
            }
        }
    }

    tracing::warn!("Giving up on section {}, it stays without a summary", request.id);
    Outcome::Failed
}

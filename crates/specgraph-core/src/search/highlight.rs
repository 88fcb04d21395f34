//! Substring search with neighbor-context snippets

use serde::{Deserialize, Serialize};

use super::QueryError;
use crate::graph::Graph;
use crate::model::{GraphNode, SectionId};
use crate::section::normalize_text;

pub const INVALID_QUERY_MESSAGE: &str = "Please enter a valid question.";
pub const NO_RESULTS_MESSAGE: &str = "Sorry, I couldn't find anything.";
pub const TRUNCATION_MARKER: &str = "...";
const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Matched,
    NoResults,
    InvalidQuery,
}

/// What the query endpoint returns: a readable answer plus the ids to highlight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub highlight: Vec<SectionId>,
    pub status: QueryStatus,
}

impl QueryResponse {
    pub fn invalid_query() -> Self {
        QueryResponse {
            answer: INVALID_QUERY_MESSAGE.to_string(),
            highlight: Vec::new(),
            status: QueryStatus::InvalidQuery,
        }
    }

    pub fn no_results() -> Self {
        QueryResponse {
            answer: NO_RESULTS_MESSAGE.to_string(),
            highlight: Vec::new(),
            status: QueryStatus::NoResults,
        }
    }
}

/// Trimmed, lowercased query text; blank queries are rejected.
pub fn normalize_query(query: &str) -> Result<String, QueryError> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Err(QueryError::InvalidQuery);
    }
    Ok(query)
}

/// Find every node whose title or text contains `query` (case-insensitive) and build
/// an answer from its text and its parent, sibling and child snippets.
pub fn highlight_query(
    graph: &Graph,
    query: &str,
    snippet_chars: usize,
) -> Result<QueryResponse, QueryError> {
    let needle = normalize_query(query)?;

    let mut blocks = Vec::new();
    let mut highlight = Vec::new();
    for node in graph.nodes() {
        let haystack = format!("{} {}", node.title, node.text).to_lowercase();
        if !haystack.contains(&needle) {
            continue;
        }
        highlight.push(node.id.clone());
        blocks.push(answer_block(graph, node, snippet_chars));
    }

    tracing::debug!("Query {:?} matched {} sections", needle, highlight.len());
    if highlight.is_empty() {
        return Ok(QueryResponse::no_results());
    }
    Ok(QueryResponse {
        answer: blocks.join(BLOCK_SEPARATOR),
        highlight,
        status: QueryStatus::Matched,
    })
}

fn answer_block(graph: &Graph, node: &GraphNode, snippet_chars: usize) -> String {
    let mut block = format!("{} {}", label(node), node.text);

    let snippets: Vec<String> = node
        .neighbors
        .iter()
        .filter_map(|id| graph.node(id.as_str()))
        .filter(|n| !n.text.trim().is_empty())
        .map(|n| {
            format!(
                "  -> {} {}",
                label(n),
                truncate_snippet(&n.text, snippet_chars)
            )
        })
        .collect();

    if !snippets.is_empty() {
        block.push_str("\n\n");
        block.push_str(&snippets.join("\n"));
    }
    block
}

/// `[id] title:`, or just `[id]` when the title only repeats the start of the text.
fn label(node: &GraphNode) -> String {
    let title = node.title.trim();
    let restates_text = normalize_text(&node.text).starts_with(title);
    if title.is_empty() || title == node.id.as_str() || restates_text {
        format!("[{}]", node.id)
    } else {
        format!("[{}] {}:", node.id, title)
    }
}

/// Cap `text` at `max_chars` characters, appending the truncation marker when cut.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

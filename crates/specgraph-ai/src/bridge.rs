//! Summarizer trait and the request/response types shared by all providers

use anyhow::Result;
use serde::{Deserialize, Serialize};
use specgraph_core::{impact_layers, ChangeType, Graph, GraphNode, SectionId};

/// Everything a provider needs to summarize one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRequest {
    pub id: SectionId,
    pub title: String,
    pub text: String,
    pub change_type: ChangeType,
    /// The section's id in the other version, when it was renumbered.
    pub counterpart: Option<SectionId>,
    /// Title of the enclosing section, if any.
    pub parent_title: Option<String>,
}

impl SummaryRequest {
    pub fn from_node(graph: &Graph, node: &GraphNode) -> Self {
        let parent_title = node
            .neighbors
            .parent
            .first()
            .and_then(|id| graph.node(id.as_str()))
            .map(|parent| parent.title.clone());
        SummaryRequest {
            id: node.id.clone(),
            title: node.title.clone(),
            text: node.text.clone(),
            change_type: node.change_type,
            counterpart: node.renumbered.as_ref().map(|r| r.counterpart.clone()),
            parent_title,
        }
    }
}

/// A section that a change directly affects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactedSection {
    pub id: SectionId,
    pub title: String,
}

/// Request to explain one section's change in the context of what it affects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainRequest {
    pub section: SummaryRequest,
    pub impacted: Vec<ImpactedSection>,
}

impl ExplainRequest {
    /// `None` when `id` is not in the graph.
    pub fn for_section(graph: &Graph, id: &str) -> Option<Self> {
        let node = graph.node(id)?;
        let impacted = impact_layers(graph, id)
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| graph.node(id.as_str()))
            .map(|n| ImpactedSection {
                id: n.id.clone(),
                title: n.title.clone(),
            })
            .collect();
        Some(ExplainRequest {
            section: SummaryRequest::from_node(graph, node),
            impacted,
        })
    }
}

/// Provider output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    /// Tokens billed for this call; zero for offline providers.
    pub tokens_used: u32,
}

/// Summarization backend
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    /// One or two sentences describing the section and how it changed.
    async fn summarize(&self, request: &SummaryRequest) -> Result<Summary>;

    /// Explain a change and what it affects.
    async fn explain(&self, request: &ExplainRequest) -> Result<Summary>;

    /// Get provider name
    fn name(&self) -> &str;
}

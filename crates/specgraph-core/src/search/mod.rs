//! Query layer over a loaded graph: substring highlight search and ranked tf-idf search

pub mod highlight;
pub mod ranked;
pub mod terms;

use serde::{Deserialize, Serialize};

use crate::config::QueryConfig;
use crate::graph::Graph;
use crate::model::{ChangeType, SectionId};
use crate::traversal::downstream_impact;

pub use highlight::{highlight_query, QueryResponse, QueryStatus};
pub use ranked::{RankedHit, TfIdfIndex};

/// Query failures, split by who has to act on them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Blank query text. Reported back to the user, not an operational failure.
    #[error("invalid query: query text is empty")]
    InvalidQuery,

    /// The loaded graph and its index disagree.
    #[error("internal query error: {0}")]
    Internal(String),
}

impl QueryError {
    pub fn is_user_facing(&self) -> bool {
        matches!(self, QueryError::InvalidQuery)
    }
}

/// A ranked hit joined with the node it points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: SectionId,
    pub title: String,
    pub change_type: ChangeType,
    pub score: f32,
}

/// A graph paired with the similarity index built from it.
///
/// Read-only once constructed; replace the whole engine to serve a newer graph.
#[derive(Debug)]
pub struct QueryEngine {
    graph: Graph,
    index: TfIdfIndex,
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(graph: Graph, config: QueryConfig) -> Self {
        let index = TfIdfIndex::build(&graph);
        QueryEngine {
            graph,
            index,
            config,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn index(&self) -> &TfIdfIndex {
        &self.index
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Substring highlight search.
    pub fn query(&self, text: &str) -> Result<QueryResponse, QueryError> {
        highlight_query(&self.graph, text, self.config.snippet_chars)
    }

    /// Ranked similarity search; `limit` defaults to the configured search limit.
    pub fn search(&self, text: &str, limit: Option<usize>) -> Result<Vec<SearchHit>, QueryError> {
        let limit = limit.unwrap_or(self.config.search_limit);
        self.index
            .search(text, limit)?
            .into_iter()
            .map(|hit| {
                let node = self.graph.node(hit.id.as_str()).ok_or_else(|| {
                    QueryError::Internal(format!("indexed section {} is not in the graph", hit.id))
                })?;
                Ok(SearchHit {
                    id: hit.id,
                    title: node.title.clone(),
                    change_type: node.change_type,
                    score: hit.score,
                })
            })
            .collect()
    }

    pub fn impact(&self, id: &str) -> Vec<SectionId> {
        downstream_impact(&self.graph, id)
    }
}

//! SpecGraph Core: section snapshots, change classification, the unified change graph,
//! impact traversal, search, and graph persistence

pub mod builder;
pub mod cache;
pub mod config;
pub mod diff;
pub mod error;
pub mod graph;
pub mod model;
pub mod relations;
pub mod search;
pub mod section;
pub mod traversal;


#[cfg(test)]
pub mod test_utils;

pub use model::{
    ChangeType, EdgeReason, GraphEdge, GraphNode, MatchBasis, Neighbors, Renumbering, SectionId,
    SectionRecord, SourceVersion,
};
pub use graph::Graph;
pub use builder::{build_graph, GraphBuilder};
pub use diff::{classify, ChangeSummary};
pub use error::{Result, SpecGraphError};
pub use config::{AppConfig, CONFIG_FILE_NAME};
pub use section::{canonicalize_key, Section, SectionIndex};
pub use relations::{find_citations, RelationLinker};
pub use search::{QueryEngine, QueryError, QueryResponse, QueryStatus, SearchHit};
pub use traversal::{downstream_impact, impact_layers};
pub use cache::{clear_cache, export_changes, load_graph, save_graph, write_changes_json, ChangeEntry};

//! Graph wrapper using petgraph::DiGraph with a section-id lookup table

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::{Result, SpecGraphError};
use crate::model::*;

/// The unified section graph: typed node records, typed edge records and an id index.
///
/// Built once by [`crate::builder::GraphBuilder`] or loaded by [`crate::cache`]. The only
/// mutation after construction is attaching summaries.
#[derive(Clone)]
pub struct Graph {
    inner: DiGraph<GraphNode, GraphEdge>,
    index: HashMap<SectionId, NodeIndex>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Graph {
            inner: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Assemble a graph from node and edge records, checking the graph invariants:
    /// unique ids, no self loops, every edge endpoint is a node.
    pub fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Result<Self> {
        let mut graph = Graph {
            inner: DiGraph::with_capacity(nodes.len(), edges.len()),
            index: HashMap::with_capacity(nodes.len()),
        };

        for node in nodes {
            if graph.index.contains_key(&node.id) {
                return Err(SpecGraphError::schema(format!("duplicate node id {}", node.id)));
            }
            let id = node.id.clone();
            let idx = graph.inner.add_node(node);
            graph.index.insert(id, idx);
        }

        for edge in edges {
            if edge.is_self_loop() {
                return Err(SpecGraphError::schema(format!(
                    "self-loop edge on {} ({})",
                    edge.source, edge.reason
                )));
            }
            let (Some(&source), Some(&target)) =
                (graph.index.get(&edge.source), graph.index.get(&edge.target))
            else {
                return Err(SpecGraphError::schema(format!(
                    "edge {} -> {} ({}) has a missing endpoint",
                    edge.source, edge.target, edge.reason
                )));
            };
            graph.inner.add_edge(source, target, edge);
        }

        Ok(graph)
    }

    /// Get a node by section id.
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index
            .get(id)
            .and_then(|&idx| self.inner.node_weight(idx))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Total number of nodes.
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Iterate over all nodes in insertion (ascending id) order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.inner.raw_nodes().iter().map(|n| &n.weight)
    }

    /// Iterate over all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.inner.raw_edges().iter().map(|e| &e.weight)
    }

    /// Get all outgoing edges from a node.
    pub fn edges_from(&self, source: &str) -> impl Iterator<Item = &GraphEdge> {
        self.edges_directed(source, Direction::Outgoing)
    }

    /// Get all incoming edges to a node.
    pub fn edges_to(&self, target: &str) -> impl Iterator<Item = &GraphEdge> {
        self.edges_directed(target, Direction::Incoming)
    }

    fn edges_directed(&self, id: &str, direction: Direction) -> impl Iterator<Item = &GraphEdge> {
        self.index
            .get(id)
            .into_iter()
            .flat_map(move |&idx| self.inner.edges_directed(idx, direction))
            .map(|edge_ref| edge_ref.weight())
    }

    /// Check if an edge with the given reason exists between two nodes.
    pub fn has_edge_between(&self, source: &str, target: &str, reason: EdgeReason) -> bool {
        self.edges_from(source)
            .any(|e| e.target.as_str() == target && e.reason == reason)
    }

    /// Nodes with the given change type, in id order.
    pub fn nodes_of_type(&self, change_type: ChangeType) -> impl Iterator<Item = &GraphNode> {
        self.nodes().filter(move |n| n.change_type == change_type)
    }

    /// All hierarchy ancestors of a node, nearest first.
    pub fn ancestors(&self, id: &str) -> Vec<SectionId> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.node(id);

        while let Some(node) = current {
            let Some(parent) = node.neighbors.parent.first() else {
                break;
            };
            if !seen.insert(parent.clone()) {
                break;
            }
            ancestors.push(parent.clone());
            current = self.node(parent.as_str());
        }

        ancestors
    }

    /// Attach an enrichment summary. Returns `false` if the node does not exist.
    pub fn set_summary(&mut self, id: &str, summary: String) -> bool {
        match self.index.get(id).and_then(|&idx| self.inner.node_weight_mut(idx)) {
            Some(node) => {
                node.summary = Some(summary);
                true
            }
            None => false,
        }
    }

    /// Clone out node and edge records, for persistence.
    pub fn to_parts(&self) -> (Vec<GraphNode>, Vec<GraphEdge>) {
        (
            self.nodes().cloned().collect(),
            self.edges().cloned().collect(),
        )
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: same node records and same edge records, in order.
impl PartialEq for Graph {
    fn eq(&self, other: &Self) -> bool {
        self.node_count() == other.node_count()
            && self.edge_count() == other.edge_count()
            && self.nodes().eq(other.nodes())
            && self.edges().eq(other.edges())
    }
}

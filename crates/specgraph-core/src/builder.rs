//! Unified graph construction: classification + relations -> immutable Graph

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::config::LinkerConfig;
use crate::diff::{classify, ChangeSummary};
use crate::error::Result;
use crate::graph::Graph;
use crate::model::*;
use crate::relations::{RelationLinker, Relations};
use crate::section::SectionIndex;

/// Builds a [`Graph`] from two section snapshots.
pub struct GraphBuilder {
    linker: RelationLinker,
}

impl GraphBuilder {
    pub fn new(config: LinkerConfig) -> Self {
        GraphBuilder {
            linker: RelationLinker::new(config),
        }
    }

    /// Classify, link and assemble. Identical inputs always produce identical graphs.
    pub fn build(&self, old: &SectionIndex, new: &SectionIndex) -> Result<Graph> {
        let records = classify(old, new);
        let summary = ChangeSummary::from_types(records.values().map(|r| r.change_type));
        tracing::info!(
            "Classified {} sections: {} added, {} removed, {} modified, {} unchanged",
            summary.total(),
            summary.added,
            summary.removed,
            summary.modified,
            summary.unchanged
        );

        let relations = self.linker.link(old, new, &records);
        assemble(records, relations)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(LinkerConfig::default())
    }
}

/// Build a graph with the default linker settings.
pub fn build_graph(old: &SectionIndex, new: &SectionIndex) -> Result<Graph> {
    GraphBuilder::default().build(old, new)
}

/// Merge classified records and raw relations into a graph.
///
/// Orphan edges are dropped with a warning, duplicates and self loops are collapsed away,
/// and neighbor lists are derived from the surviving edges.
pub fn assemble(records: BTreeMap<SectionId, SectionRecord>, relations: Relations) -> Result<Graph> {
    let mut edges: BTreeSet<GraphEdge> = BTreeSet::new();
    let mut dropped = 0usize;
    for edge in relations.edges {
        if edge.is_self_loop() {
            continue;
        }
        if !records.contains_key(&edge.source) || !records.contains_key(&edge.target) {
            tracing::warn!(
                "Dropping {} edge {} -> {}: endpoint is not a known section",
                edge.reason,
                edge.source,
                edge.target
            );
            dropped += 1;
            continue;
        }
        edges.insert(edge);
    }

    let mut neighbors: HashMap<&SectionId, Neighbors> = HashMap::new();
    for edge in &edges {
        match edge.reason {
            EdgeReason::HierarchyParent => {
                neighbors.entry(&edge.target).or_default().parent.push(edge.source.clone());
                neighbors.entry(&edge.source).or_default().children.push(edge.target.clone());
            }
            EdgeReason::HierarchySibling => {
                neighbors.entry(&edge.source).or_default().siblings.push(edge.target.clone());
            }
            EdgeReason::CrossReference => {}
        }
    }
    for entry in neighbors.values_mut() {
        for list in [&mut entry.parent, &mut entry.siblings, &mut entry.children] {
            list.sort();
            list.dedup();
        }
    }

    let mut renumbered: HashMap<SectionId, Renumbering> = HashMap::new();
    for m in relations.renumberings {
        renumbered.insert(
            m.old_id.clone(),
            Renumbering {
                counterpart: m.new_id.clone(),
                basis: m.basis.clone(),
            },
        );
        renumbered.insert(
            m.new_id,
            Renumbering {
                counterpart: m.old_id,
                basis: m.basis,
            },
        );
    }

    let nodes: Vec<GraphNode> = records
        .values()
        .map(|record| GraphNode {
            id: record.id.clone(),
            title: record.title.clone(),
            text: record.source_text().to_string(),
            change_type: record.change_type,
            source_version: record.source_version(),
            neighbors: neighbors.remove(&record.id).unwrap_or_default(),
            summary: None,
            renumbered: renumbered.remove(&record.id),
        })
        .collect();

    let graph = Graph::from_parts(nodes, edges.into_iter().collect())?;
    tracing::info!(
        "Graph built with {} nodes and {} edges ({} orphan edges dropped)",
        graph.node_count(),
        graph.edge_count(),
        dropped
    );
    Ok(graph)
}

//! Downstream impact: which sections are affected when one section changes

use std::collections::{BTreeSet, HashSet};

use crate::graph::Graph;
use crate::model::{EdgeReason, SectionId};

/// Sections directly affected by a change to `id`.
///
/// Children (hierarchy edges followed forward), siblings, and every section that cites
/// `id` (cross-reference edges followed from cited to citing).
fn affected_by<'a>(graph: &'a Graph, id: &'a str) -> impl Iterator<Item = &'a SectionId> {
    let forward = graph
        .edges_from(id)
        .filter(|e| matches!(e.reason, EdgeReason::HierarchyParent | EdgeReason::HierarchySibling))
        .map(|e| &e.target);
    let cited_by = graph
        .edges_to(id)
        .filter(|e| e.reason == EdgeReason::CrossReference)
        .map(|e| &e.source);
    forward.chain(cited_by)
}

/// Breadth-first impact layers from `start_id`, each layer sorted by id.
///
/// The start id is never reported and no id appears twice. An unknown start id yields
/// no layers.
pub fn impact_layers(graph: &Graph, start_id: &str) -> Vec<Vec<SectionId>> {
    let Some(start) = graph.node(start_id) else {
        tracing::debug!("Impact requested for unknown section {}", start_id);
        return Vec::new();
    };

    let mut visited: HashSet<&SectionId> = HashSet::from([&start.id]);
    let mut frontier: Vec<&SectionId> = vec![&start.id];
    let mut layers = Vec::new();

    while !frontier.is_empty() {
        let mut next: BTreeSet<&SectionId> = BTreeSet::new();
        for &id in &frontier {
            for neighbor in affected_by(graph, id.as_str()) {
                if !visited.contains(neighbor) {
                    next.insert(neighbor);
                }
            }
        }
        visited.extend(next.iter().copied());
        frontier = next.into_iter().collect();
        if !frontier.is_empty() {
            layers.push(frontier.iter().map(|id| (*id).clone()).collect());
        }
    }

    layers
}

/// Every section transitively affected by a change to `start_id`, in BFS layer order
/// with ties broken by ascending id.
pub fn downstream_impact(graph: &Graph, start_id: &str) -> Vec<SectionId> {
    impact_layers(graph, start_id).into_iter().flatten().collect()
}

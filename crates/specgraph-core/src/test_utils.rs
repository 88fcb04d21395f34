//! Test utilities for SpecGraph

use crate::builder::build_graph;
use crate::graph::Graph;
use crate::section::SectionIndex;

/// Build a snapshot from `(raw key, text)` pairs.
pub fn snapshot(pairs: &[(&str, &str)]) -> SectionIndex {
    SectionIndex::from_pairs(pairs.iter().copied()).unwrap()
}

/// Build a graph from two literal snapshots.
pub fn graph_from(old: &[(&str, &str)], new: &[(&str, &str)]) -> Graph {
    build_graph(&snapshot(old), &snapshot(new)).unwrap()
}

/// Old version of a small registration/security chapter.
pub fn sample_old() -> SectionIndex {
    snapshot(&[
        ("4.3", "Registration management. See clause 5.1 for details."),
        ("4.3.1", "Initial registration."),
        ("4.3.2", "Mobility registration update."),
        ("4.3.2.1", "Periodic update timer T3512."),
        ("5.1", "Security procedures."),
        ("5.2", "Old authentication text."),
    ])
}

/// New version: `4.3.1` reworded, `5.2` dropped, `5.3` introduced.
pub fn sample_new() -> SectionIndex {
    snapshot(&[
        ("4.3", "Registration management. See clause 5.1 for details."),
        ("4.3.1", "Initial registration procedure."),
        ("4.3.2", "Mobility registration update."),
        ("4.3.2.1", "Periodic update timer T3512."),
        ("5.1", "Security procedures."),
        ("5.3", "New service request text."),
    ])
}

pub fn sample_graph() -> Graph {
    build_graph(&sample_old(), &sample_new()).unwrap()
}

/// Ids as plain strings, for compact assertions.
pub fn ids<'a, I, T>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a T>,
    T: AsRef<str> + 'a,
{
    ids.into_iter().map(|id| id.as_ref().to_string()).collect()
}

//! Relation linking: hierarchy, sibling and cross-reference edges, plus renumbering matches

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::LinkerConfig;
use crate::model::*;
use crate::search::terms::text_similarity;
use crate::section::{normalize_text, SectionIndex};

/// `clause 4.3`, `subclause 5.5.1.2A`, `section 7` or a bare dotted number such as `4.3.2`.
static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i:\b(?:sub)?clauses?|\bsections?)\s+(\d+[A-Z]?(?:\.\d+[A-Z]?)*)|\b(\d+[A-Z]?(?:\.\d+[A-Z]?)+)\b",
    )
    .expect("citation pattern")
});

/// A removed section paired with an added section carrying a different number.
#[derive(Debug, Clone, PartialEq)]
pub struct RenumberMatch {
    pub old_id: SectionId,
    pub new_id: SectionId,
    pub basis: MatchBasis,
}

/// Everything the linker derives from a pair of snapshots.
#[derive(Debug, Clone, Default)]
pub struct Relations {
    /// Raw edges; may contain duplicates and endpoints that are not graph nodes.
    pub edges: Vec<GraphEdge>,
    pub renumberings: Vec<RenumberMatch>,
}

/// Derives structural and citation edges between section ids.
pub struct RelationLinker {
    config: LinkerConfig,
}

impl RelationLinker {
    pub fn new(config: LinkerConfig) -> Self {
        RelationLinker { config }
    }

    pub fn link(
        &self,
        old: &SectionIndex,
        new: &SectionIndex,
        records: &BTreeMap<SectionId, SectionRecord>,
    ) -> Relations {
        let mut edges = hierarchy_edges(old);
        edges.extend(hierarchy_edges(new));
        for section in old.iter().chain(new.iter()) {
            edges.extend(cross_reference_edges(&section.id, &section.text));
        }

        let renumberings = self.match_renumbered(records);

        tracing::debug!(
            "Linked {} raw edges, {} renumbered sections",
            edges.len(),
            renumberings.len()
        );
        Relations {
            edges,
            renumberings,
        }
    }

    /// Pair removed ids with added ids: unique equal titles first, then the most similar
    /// same-depth text at or above the threshold. Unmatched ids stay added/removed.
    pub fn match_renumbered(
        &self,
        records: &BTreeMap<SectionId, SectionRecord>,
    ) -> Vec<RenumberMatch> {
        let removed: Vec<&SectionRecord> = records
            .values()
            .filter(|r| r.change_type == ChangeType::Removed)
            .collect();
        let added: Vec<&SectionRecord> = records
            .values()
            .filter(|r| r.change_type == ChangeType::Added)
            .collect();
        if removed.is_empty() || added.is_empty() {
            return Vec::new();
        }

        let removed_titles = title_histogram(&removed);
        let added_titles = title_histogram(&added);
        let mut claimed: HashSet<&SectionId> = HashSet::new();
        let mut matches = Vec::new();

        for old in &removed {
            let mut found = None;

            if self.config.match_titles {
                if let Some(key) = title_key(old) {
                    let unique = removed_titles.get(&key) == Some(&1) && added_titles.get(&key) == Some(&1);
                    if unique {
                        found = added
                            .iter()
                            .find(|a| !claimed.contains(&a.id) && title_key(a).as_ref() == Some(&key))
                            .map(|a| (*a, MatchBasis::Title));
                    }
                }
            }

            if found.is_none() {
                let old_text = old.old_text.as_deref().unwrap_or_default();
                let depth = old.id.depth();
                let mut best: Option<(&SectionRecord, f32)> = None;
                for candidate in added
                    .iter()
                    .filter(|a| a.id.depth() == depth && !claimed.contains(&a.id))
                {
                    let score = text_similarity(old_text, candidate.new_text.as_deref().unwrap_or_default());
                    if best.is_none_or(|(_, s)| score > s) {
                        best = Some((*candidate, score));
                    }
                }
                found = best
                    .filter(|(_, score)| *score >= self.config.similarity_threshold)
                    .map(|(a, score)| (a, MatchBasis::Similarity(score)));
            }

            match found {
                Some((new, basis)) => {
                    tracing::debug!("Section {} renumbered to {} ({:?})", old.id, new.id, basis);
                    claimed.insert(&new.id);
                    matches.push(RenumberMatch {
                        old_id: old.id.clone(),
                        new_id: new.id.clone(),
                        basis,
                    });
                }
                None => {
                    tracing::debug!("No renumbering match for removed section {}", old.id);
                }
            }
        }

        matches
    }
}

impl Default for RelationLinker {
    fn default() -> Self {
        Self::new(LinkerConfig::default())
    }
}

/// Case-folded, whitespace-normalized title; `None` when it is empty or just the id.
fn title_key(record: &SectionRecord) -> Option<String> {
    let key = normalize_text(&record.title).to_lowercase();
    if key.is_empty() || key == record.id.as_str().to_lowercase() {
        None
    } else {
        Some(key)
    }
}

fn title_histogram(records: &[&SectionRecord]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for key in records.iter().filter_map(|r| title_key(r)) {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Parent -> child edges and adjacent-sibling edges within one version.
///
/// A parent edge needs the parent id to exist in the same version. Siblings share a
/// parent prefix and are linked to the immediately previous and next enumerator present.
pub fn hierarchy_edges(index: &SectionIndex) -> Vec<GraphEdge> {
    let mut edges = Vec::new();
    let mut groups: BTreeMap<Option<SectionId>, Vec<&SectionId>> = BTreeMap::new();

    for id in index.ids().filter(|id| id.is_numbered()) {
        let parent = id.parent();
        if let Some(parent) = parent.as_ref().filter(|p| index.contains(p)) {
            edges.push(GraphEdge::new(
                parent.clone(),
                id.clone(),
                EdgeReason::HierarchyParent,
            ));
        }
        groups.entry(parent).or_default().push(id);
    }

    for members in groups.values_mut() {
        members.sort_by(|a, b| {
            a.enumerator()
                .cmp(&b.enumerator())
                .then_with(|| a.cmp(b))
        });
        for pair in members.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            edges.push(GraphEdge::new(a.clone(), b.clone(), EdgeReason::HierarchySibling));
            edges.push(GraphEdge::new(b.clone(), a.clone(), EdgeReason::HierarchySibling));
        }
    }

    edges
}

/// Section ids cited in `text`, in order of appearance, duplicates removed.
pub fn find_citations(text: &str) -> Vec<SectionId> {
    let mut seen = HashSet::new();
    CITATION
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| SectionId::new(m.as_str()))
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// `cites` edges from `id` to every section its text mentions, self-citations excluded.
pub fn cross_reference_edges(id: &SectionId, text: &str) -> Vec<GraphEdge> {
    find_citations(text)
        .into_iter()
        .filter(|cited| cited != id)
        .map(|cited| GraphEdge::new(id.clone(), cited, EdgeReason::CrossReference))
        .collect()
}

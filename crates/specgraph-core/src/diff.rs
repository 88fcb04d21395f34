//! Change classification between two section snapshots

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::section::{normalize_text, SectionIndex};

/// Assign a change type to every id in the union of both snapshots.
///
/// Texts are compared after whitespace normalization; the comparison is case-sensitive.
pub fn classify(old: &SectionIndex, new: &SectionIndex) -> BTreeMap<SectionId, SectionRecord> {
    let ids: BTreeSet<&SectionId> = old.ids().chain(new.ids()).collect();

    ids.into_iter()
        .map(|id| {
            let old_section = old.get(id);
            let new_section = new.get(id);
            let change_type = match (old_section, new_section) {
                (None, Some(_)) => ChangeType::Added,
                (Some(_), None) => ChangeType::Removed,
                (Some(o), Some(n)) if normalize_text(&o.text) != normalize_text(&n.text) => {
                    ChangeType::Modified
                }
                _ => ChangeType::Unchanged,
            };
            // the union only holds ids present on at least one side
            let title = match change_type {
                ChangeType::Added => new_section.map(|s| s.title()),
                _ => old_section.or(new_section).map(|s| s.title()),
            }
            .unwrap_or_else(|| id.to_string());

            let record = SectionRecord {
                id: id.clone(),
                change_type,
                old_text: old_section.map(|s| s.text.clone()),
                new_text: new_section.map(|s| s.text.clone()),
                title,
            };
            (id.clone(), record)
        })
        .collect()
}

/// Per-type counts over a classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

impl ChangeSummary {
    pub fn from_types(types: impl IntoIterator<Item = ChangeType>) -> Self {
        let mut summary = ChangeSummary::default();
        for change_type in types {
            match change_type {
                ChangeType::Added => summary.added += 1,
                ChangeType::Removed => summary.removed += 1,
                ChangeType::Modified => summary.modified += 1,
                ChangeType::Unchanged => summary.unchanged += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.added + self.removed + self.modified + self.unchanged
    }

    /// Check if nothing changed between the two versions.
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.modified == 0
    }
}

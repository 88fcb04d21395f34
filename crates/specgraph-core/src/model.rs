//! Core data structures for the section change graph

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Canonical key of one document section, usually a dotted numeric path such as `4.3.2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SectionId(String);

impl SectionId {
    /// Wrap an already canonical id. Use [`crate::section::canonicalize_key`] for raw parser keys.
    pub fn new(id: impl Into<String>) -> Self {
        SectionId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of dotted components (`4.3.2` has depth 3).
    pub fn depth(&self) -> usize {
        self.0.split('.').count()
    }

    /// True when every dotted component is a number, optionally followed by letters (`4.3A`).
    pub fn is_numbered(&self) -> bool {
        self.0.split('.').all(|c| split_enumerator(c).is_some())
    }

    /// The id with its last dotted component removed, for numbered ids of depth > 1.
    pub fn parent(&self) -> Option<SectionId> {
        if !self.is_numbered() {
            return None;
        }
        self.0
            .rsplit_once('.')
            .map(|(head, _)| SectionId(head.to_string()))
    }

    /// The last dotted component split into its number and letter suffix.
    pub fn enumerator(&self) -> Option<(u64, &str)> {
        if !self.is_numbered() {
            return None;
        }
        let last = self.0.rsplit('.').next()?;
        split_enumerator(last)
    }
}

fn split_enumerator(component: &str) -> Option<(u64, &str)> {
    let digits = component.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let (number, suffix) = component.split_at(digits);
    if !suffix.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    number.parse().ok().map(|n| (n, suffix))
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for SectionId {
    fn from(value: &str) -> Self {
        SectionId(value.to_string())
    }
}

impl Borrow<str> for SectionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SectionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Status of a section between the old and the new document version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
    Unchanged,
}

impl ChangeType {
    pub const ALL: [ChangeType; 4] = [
        ChangeType::Added,
        ChangeType::Removed,
        ChangeType::Modified,
        ChangeType::Unchanged,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Removed => "removed",
            ChangeType::Modified => "modified",
            ChangeType::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which document version a node's numbering, title and text are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceVersion {
    Old,
    New,
}

impl SourceVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceVersion::Old => "old",
            SourceVersion::New => "new",
        }
    }
}

/// Why an edge exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeReason {
    /// Parent section -> child section.
    HierarchyParent,
    /// Adjacent sections under the same parent. Stored once per direction.
    HierarchySibling,
    /// Citing section -> cited section.
    CrossReference,
}

impl EdgeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeReason::HierarchyParent => "hierarchy-parent",
            EdgeReason::HierarchySibling => "hierarchy-sibling",
            EdgeReason::CrossReference => "cross-reference",
        }
    }
}

impl fmt::Display for EdgeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed relation between two sections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: SectionId,
    pub target: SectionId,
    pub reason: EdgeReason,
}

impl GraphEdge {
    pub fn new(source: SectionId, target: SectionId, reason: EdgeReason) -> Self {
        GraphEdge {
            source,
            target,
            reason,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Hierarchical neighbors of a node, derived from the edge set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Neighbors {
    pub parent: Vec<SectionId>,
    pub siblings: Vec<SectionId>,
    pub children: Vec<SectionId>,
}

impl Neighbors {
    /// Parent, siblings, children, in that order.
    pub fn iter(&self) -> impl Iterator<Item = &SectionId> {
        self.parent
            .iter()
            .chain(self.siblings.iter())
            .chain(self.children.iter())
    }
}

/// How a removed section was paired with an added one under a different number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchBasis {
    Title,
    Similarity(f32),
}

/// Renumbering annotation: the id this section corresponds to in the other version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Renumbering {
    pub counterpart: SectionId,
    pub basis: MatchBasis,
}

/// Per-section output of the diff classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub id: SectionId,
    pub change_type: ChangeType,
    pub old_text: Option<String>,
    pub new_text: Option<String>,
    pub title: String,
}

impl SectionRecord {
    /// Added sections come from the new version; everything else from the old one,
    /// falling back to new when the old text is absent.
    pub fn source_version(&self) -> SourceVersion {
        match self.change_type {
            ChangeType::Added => SourceVersion::New,
            _ if self.old_text.is_some() => SourceVersion::Old,
            _ => SourceVersion::New,
        }
    }

    /// Text drawn from the source version.
    pub fn source_text(&self) -> &str {
        let text = match self.source_version() {
            SourceVersion::Old => self.old_text.as_deref(),
            SourceVersion::New => self.new_text.as_deref(),
        };
        text.unwrap_or_default()
    }
}

/// A single node in the unified section graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: SectionId,
    pub title: String,
    pub text: String,
    pub change_type: ChangeType,
    pub source_version: SourceVersion,
    pub neighbors: Neighbors,
    /// Filled by the enrichment pass; never affects identity, type or edges.
    pub summary: Option<String>,
    pub renumbered: Option<Renumbering>,
}

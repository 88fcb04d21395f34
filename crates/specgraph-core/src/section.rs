//! Section snapshots: canonical id -> section text, one per document version

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use crate::error::{Result, SpecGraphError};
use crate::model::SectionId;

/// Longest derived title, in characters.
const MAX_TITLE_CHARS: usize = 120;

/// Snapshot entries in document order, duplicates included.
struct RawEntries(Vec<(String, String)>);

impl<'de> Deserialize<'de> for RawEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = RawEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of section id -> section text")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<RawEntries, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    entries.push(entry);
                }
                Ok(RawEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// One section of one document version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    /// Metadata that followed the id after a tab in the parser output, if any.
    pub heading: Option<String>,
    pub text: String,
}

impl Section {
    pub fn title(&self) -> String {
        derive_title(&self.id, self.heading.as_deref(), &self.text)
    }
}

/// Ordered mapping of canonical section id to section text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionIndex {
    sections: Vec<Section>,
    lookup: HashMap<SectionId, usize>,
}

impl SectionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from raw parser keys and texts, preserving order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut index = SectionIndex::new();
        for (key, text) in pairs {
            index.insert_raw(key.as_ref(), text.into())?;
        }
        Ok(index)
    }

    /// Canonicalize `raw_key` and add the section. Duplicate canonical ids are rejected.
    pub fn insert_raw(&mut self, raw_key: &str, text: String) -> Result<()> {
        let (id, heading) = canonicalize_key(raw_key).ok_or_else(|| {
            SpecGraphError::input(format!("section id {raw_key:?} is empty after canonicalization"))
        })?;
        if self.lookup.contains_key(&id) {
            return Err(SpecGraphError::input(format!(
                "duplicate section id {id} (raw key {raw_key:?})"
            )));
        }
        self.lookup.insert(id.clone(), self.sections.len());
        self.sections.push(Section { id, heading, text });
        Ok(())
    }

    pub fn get(&self, id: &SectionId) -> Option<&Section> {
        self.lookup.get(id).map(|&i| &self.sections[i])
    }

    pub fn contains(&self, id: &SectionId) -> bool {
        self.lookup.contains_key(id)
    }

    pub fn text(&self, id: &SectionId) -> Option<&str> {
        self.get(id).map(|s| s.text.as_str())
    }

    pub fn ids(&self) -> impl Iterator<Item = &SectionId> {
        self.sections.iter().map(|s| &s.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Parse a JSON object of `id -> text`, keeping document order. Repeated keys are
    /// rejected like any other duplicate id.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let RawEntries(entries) = serde_json::from_str(input).map_err(|e| {
            SpecGraphError::input(format!("snapshot is not a valid JSON object of id -> text: {e}"))
        })?;
        Self::from_pairs(entries)
    }

    /// Parse a YAML mapping of `id -> text`. Numeric-looking ids must be quoted.
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(input)
            .map_err(|e| SpecGraphError::input(format!("snapshot is not valid YAML: {e}")))?;
        let mapping = value
            .as_mapping()
            .ok_or_else(|| SpecGraphError::input("snapshot must be a YAML mapping of id -> text"))?;
        let mut index = SectionIndex::new();
        for (key, text) in mapping {
            let key = key.as_str().ok_or_else(|| {
                SpecGraphError::input(format!("non-string section id {key:?} (quote numeric ids)"))
            })?;
            let text = text.as_str().ok_or_else(|| {
                SpecGraphError::input(format!("section {key:?} has non-string text"))
            })?;
            index.insert_raw(key, text.to_string())?;
        }
        Ok(index)
    }

    /// Load a snapshot file; `.yaml`/`.yml` are read as YAML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SpecGraphError::input(format!(
                "source document not found: {}",
                path.display()
            )));
        }
        let raw = std::fs::read_to_string(path).map_err(|e| SpecGraphError::io(path, e))?;
        let index = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw),
            _ => Self::from_json_str(&raw),
        }?;
        tracing::debug!("Loaded {} sections from {}", index.len(), path.display());
        Ok(index)
    }
}

/// Cut a raw parser key at its first tab and trim it.
///
/// Returns the canonical id and the trimmed text after the tab (when non-empty),
/// or `None` if nothing is left of the id.
pub fn canonicalize_key(raw: &str) -> Option<(SectionId, Option<String>)> {
    let (head, tail) = match raw.split_once('\t') {
        Some((head, tail)) => (head, Some(tail)),
        None => (raw, None),
    };
    let id = head.trim();
    if id.is_empty() {
        return None;
    }
    let heading = tail
        .map(normalize_text)
        .filter(|h| !h.is_empty());
    Some((SectionId::new(id), heading))
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Heading metadata if present, else the first non-empty line of the text, else the id.
pub fn derive_title(id: &SectionId, heading: Option<&str>, text: &str) -> String {
    if let Some(heading) = heading.filter(|h| !h.trim().is_empty()) {
        return heading.trim().to_string();
    }
    match text.lines().map(str::trim).find(|l| !l.is_empty()) {
        Some(line) => {
            let line = normalize_text(line);
            if line.chars().count() > MAX_TITLE_CHARS {
                line.chars().take(MAX_TITLE_CHARS).collect()
            } else {
                line
            }
        }
        None => id.to_string(),
    }
}

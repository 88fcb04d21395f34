//! Graph persistence and change-set export

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpecGraphError};
use crate::graph::Graph;
use crate::model::*;

/// Bumped whenever the persisted record layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk encoding, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Json,
    Bincode,
}

impl GraphFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => GraphFormat::Json,
            _ => GraphFormat::Bincode,
        }
    }
}

/// Logical schema of a persisted graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedGraph {
    pub format_version: u32,
    pub saved_at: String,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// One entry of the change-set export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub title: String,
    pub change_type: ChangeType,
    pub source_version: SourceVersion,
    pub text: String,
    pub summary: Option<String>,
    pub renumbered: Option<Renumbering>,
}

/// Ensure the directory holding `path` exists.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            std::fs::create_dir_all(dir).map_err(|e| SpecGraphError::io(dir, e))
        }
        _ => Ok(()),
    }
}

/// Serialize the graph to `path`.
pub fn save_graph(graph: &Graph, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let (nodes, edges) = graph.to_parts();
    let persisted = PersistedGraph {
        format_version: FORMAT_VERSION,
        saved_at: chrono::Utc::now().to_rfc3339(),
        nodes,
        edges,
    };

    let bytes = match GraphFormat::from_path(path) {
        GraphFormat::Json => serde_json::to_vec_pretty(&persisted)
            .map_err(|e| SpecGraphError::persist(path, e.to_string()))?,
        GraphFormat::Bincode => bincode::serialize(&persisted)
            .map_err(|e| SpecGraphError::persist(path, e.to_string()))?,
    };
    std::fs::write(path, bytes).map_err(|e| SpecGraphError::io(path, e))?;

    tracing::info!(
        "Graph saved to {} ({} nodes, {} edges)",
        path.display(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(())
}

/// Load and validate a graph. Any decoding or invariant failure is an error; a graph is
/// never returned partially decoded.
pub fn load_graph(path: &Path) -> Result<Graph> {
    let bytes = std::fs::read(path).map_err(|e| SpecGraphError::io(path, e))?;
    let persisted: PersistedGraph = match GraphFormat::from_path(path) {
        GraphFormat::Json => serde_json::from_slice(&bytes)
            .map_err(|e| SpecGraphError::persist(path, e.to_string()))?,
        GraphFormat::Bincode => bincode::deserialize(&bytes)
            .map_err(|e| SpecGraphError::persist(path, e.to_string()))?,
    };

    if persisted.format_version != FORMAT_VERSION {
        return Err(SpecGraphError::schema(format!(
            "{} has format version {}, expected {}",
            path.display(),
            persisted.format_version,
            FORMAT_VERSION
        )));
    }

    let graph = Graph::from_parts(persisted.nodes, persisted.edges)?;
    validate_neighbors(&graph)?;

    tracing::info!(
        "Graph loaded from {} (saved {}, {} nodes, {} edges)",
        path.display(),
        persisted.saved_at,
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

fn validate_neighbors(graph: &Graph) -> Result<()> {
    for node in graph.nodes() {
        if let Some(missing) = node.neighbors.iter().find(|id| !graph.contains(id.as_str())) {
            return Err(SpecGraphError::schema(format!(
                "node {} lists unknown neighbor {}",
                node.id, missing
            )));
        }
        if node.neighbors.iter().any(|id| *id == node.id) {
            return Err(SpecGraphError::schema(format!("node {} lists itself as a neighbor", node.id)));
        }
    }
    Ok(())
}

/// Every node whose change type is not `unchanged`, keyed by plain-string id.
pub fn export_changes(graph: &Graph) -> BTreeMap<String, ChangeEntry> {
    graph
        .nodes()
        .filter(|n| n.change_type != ChangeType::Unchanged)
        .map(|n| {
            let entry = ChangeEntry {
                title: n.title.clone(),
                change_type: n.change_type,
                source_version: n.source_version,
                text: n.text.clone(),
                summary: n.summary.clone(),
                renumbered: n.renumbered.clone(),
            };
            (n.id.as_str().to_string(), entry)
        })
        .collect()
}

/// Write the change-set export as pretty JSON. Returns the number of entries written.
pub fn write_changes_json(graph: &Graph, path: &Path) -> Result<usize> {
    ensure_parent_dir(path)?;
    let changes = export_changes(graph);
    let json = serde_json::to_string_pretty(&changes)
        .map_err(|e| SpecGraphError::persist(path, e.to_string()))?;
    std::fs::write(path, json).map_err(|e| SpecGraphError::io(path, e))?;
    tracing::info!("{} changed sections saved to {}", changes.len(), path.display());
    Ok(changes.len())
}

/// Remove cached artifacts. Missing files are not an error.
pub fn clear_cache(paths: &[&Path]) -> Result<()> {
    for path in paths {
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| SpecGraphError::io(*path, e))?;
            tracing::debug!("Removed {}", path.display());
        }
    }
    Ok(())
}

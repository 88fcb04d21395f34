//! Integration tests for SpecGraph
//!
//! These tests verify that snapshot loading, graph building, persistence, enrichment,
//! querying and the CLI work together.

use std::path::{Path, PathBuf};
use std::process::Command;

use specgraph_ai::providers::local::LocalSummarizer;
use specgraph_ai::{enrich_graph, EnrichmentOptions};
use specgraph_core::config::QueryConfig;
use specgraph_core::{
    build_graph, downstream_impact, load_graph, save_graph, write_changes_json, ChangeType,
    QueryEngine, QueryStatus, SectionIndex,
};
use specgraph_server::{ServerState, ServiceContext};
use tempfile::TempDir;

const OLD_SNAPSHOT: &str = r#"{
    "4.3\tRegistration management": "The UE registers with the network. See clause 5.1.",
    "4.3.1\tInitial registration": "The UE sends a REGISTRATION REQUEST message.",
    "4.3.2\tMobility registration update": "Performed when the UE enters a new tracking area.",
    "4.3.2.1": "Periodic registration update uses timer T3512.",
    "5.1\tSecurity": "Security mode control procedure.",
    "5.2\tLegacy authentication": "EAP based primary authentication for legacy devices."
}"#;

const NEW_SNAPSHOT: &str = r#"
"4.3\tRegistration management": "The UE registers with the network. See clause 5.1."
"4.3.1\tInitial registration": "The UE sends a REGISTRATION REQUEST message including its capabilities."
"4.3.2\tMobility registration update": "Performed when the UE enters a new tracking area."
"4.3.2.1": "Periodic registration update uses timer T3512."
"5.1\tSecurity": "Security mode control procedure. See subclause 4.3.2."
"5.3\tLegacy authentication": "EAP based primary authentication for legacy devices and IoT."
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("old.json"), OLD_SNAPSHOT).unwrap();
        std::fs::write(dir.path().join("new.yaml"), NEW_SNAPSHOT).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn snapshots(&self) -> (SectionIndex, SectionIndex) {
        (
            SectionIndex::load(&self.path("old.json")).unwrap(),
            SectionIndex::load(&self.path("new.yaml")).unwrap(),
        )
    }
}

#[test]
fn test_build_persist_reload_query() {
    let ws = Workspace::new();
    let (old, new) = ws.snapshots();
    let graph = build_graph(&old, &new).unwrap();

    assert_eq!(graph.node("4.3.1").unwrap().change_type, ChangeType::Modified);
    assert_eq!(graph.node("5.1").unwrap().change_type, ChangeType::Modified);
    assert_eq!(graph.node("5.2").unwrap().change_type, ChangeType::Removed);
    assert_eq!(graph.node("5.3").unwrap().change_type, ChangeType::Added);
    // same heading on both sides
    assert_eq!(
        graph.node("5.2").unwrap().renumbered.as_ref().unwrap().counterpart.as_str(),
        "5.3"
    );

    let path = ws.path("graph.bin");
    save_graph(&graph, &path).unwrap();
    let loaded = load_graph(&path).unwrap();
    assert_eq!(loaded, graph);

    let engine = QueryEngine::new(loaded, QueryConfig::default());
    let response = engine.query("tracking area").unwrap();
    assert_eq!(response.status, QueryStatus::Matched);
    assert_eq!(response.highlight.len(), 1);
    assert_eq!(response.highlight[0].as_str(), "4.3.2");

    let hits = engine.search("periodic timer", Some(3)).unwrap();
    assert_eq!(hits[0].id.as_str(), "4.3.2.1");
}

#[test]
fn test_impact_uses_citations_from_both_versions() {
    let ws = Workspace::new();
    let (old, new) = ws.snapshots();
    let graph = build_graph(&old, &new).unwrap();

    // 5.1 cites 4.3.2 only in the new version; the union still links them
    let impacted: Vec<String> = downstream_impact(&graph, "4.3.2")
        .iter()
        .map(|id| id.to_string())
        .collect();
    assert_eq!(impacted[..3], ["4.3.1", "4.3.2.1", "5.1"]);
    assert!(!impacted.contains(&"4.3.2".to_string()));
}

#[tokio::test]
async fn test_enrich_then_serve_snapshot() {
    let ws = Workspace::new();
    let (old, new) = ws.snapshots();
    let mut graph = build_graph(&old, &new).unwrap();

    let report = enrich_graph(&mut graph, &LocalSummarizer::new(), &EnrichmentOptions::default()).await;
    assert_eq!(report.failed, 0);
    assert_eq!(report.summarized, 4);

    let path = ws.path("graph.json");
    save_graph(&graph, &path).unwrap();
    write_changes_json(&graph, &ws.path("changes.json")).unwrap();

    let state = ServerState::open(path.clone(), QueryConfig::default()).unwrap();
    let context = state.snapshot().await;
    assert!(context.graph().node("5.3").unwrap().summary.is_some());
    assert!(context.graph().node("4.3").unwrap().summary.is_none());

    // a fresh build replaces the served context without touching the old snapshot
    let rebuilt = build_graph(&new, &new).unwrap();
    state
        .replace(ServiceContext::new(rebuilt, QueryConfig::default()))
        .await;
    let current = state.snapshot().await;
    assert!(current.graph().nodes().all(|n| n.change_type == ChangeType::Unchanged));
    assert_eq!(context.graph().node("5.2").unwrap().change_type, ChangeType::Removed);
}

fn specgraph(config: &Path, args: &[&str]) -> (bool, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_specgraph"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute specgraph");
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).to_string(),
    )
}

#[test]
fn test_cli_build_and_inspect() {
    let ws = Workspace::new();
    let config = ws.path("specgraph.toml");
    std::fs::write(
        &config,
        format!(
            r#"
[paths]
old = "{}"
new = "{}"
graph = "{}"
changes = "{}"
"#,
            ws.path("old.json").display(),
            ws.path("new.yaml").display(),
            ws.path("out/graph.bin").display(),
            ws.path("out/changes.json").display(),
        ),
    )
    .unwrap();

    let (ok, stdout) = specgraph(&config, &["build"]);
    assert!(ok, "build failed: {stdout}");
    assert!(stdout.contains("7 sections (1 added, 1 removed, 2 modified, 3 unchanged)"));
    assert!(ws.path("out/graph.bin").exists());
    assert!(ws.path("out/changes.json").exists());

    let (ok, stdout) = specgraph(&config, &["impact", "4.3.2"]);
    assert!(ok);
    assert!(stdout.contains("4.3.1, 4.3.2.1, 5.1"));

    let (ok, stdout) = specgraph(&config, &["query", "   "]);
    assert!(ok);
    assert!(stdout.contains("Please enter a valid question."));

    let (ok, stdout) = specgraph(&config, &["explain", "5.1"]);
    assert!(ok);
    assert!(stdout.contains("Modified section 5.1"));

    let (ok, _) = specgraph(&config, &["clear"]);
    assert!(ok);
    assert!(!ws.path("out/graph.bin").exists());

    let (ok, _) = specgraph(&config, &["impact", "4.3.2"]);
    assert!(!ok, "impact without a saved graph must fail");
}

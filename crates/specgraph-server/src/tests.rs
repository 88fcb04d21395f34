//! Router tests for specgraph-server

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use specgraph_core::config::QueryConfig;
use specgraph_core::search::highlight::{INVALID_QUERY_MESSAGE, NO_RESULTS_MESSAGE};
use specgraph_core::{build_graph, save_graph, Graph, SectionIndex};
use tower::ServiceExt;

use crate::router::create_router;
use crate::{ServerState, ServiceContext};

fn graph(pairs_old: &[(&str, &str)], pairs_new: &[(&str, &str)]) -> Graph {
    let old = SectionIndex::from_pairs(pairs_old.iter().copied()).unwrap();
    let new = SectionIndex::from_pairs(pairs_new.iter().copied()).unwrap();
    build_graph(&old, &new).unwrap()
}

fn sample_graph() -> Graph {
    graph(
        &[
            ("4.3", "Registration management. See clause 5.1 for details."),
            ("4.3.1", "Initial registration."),
            ("4.3.2", "Mobility registration update."),
            ("4.3.2.1", "Periodic update timer T3512."),
            ("5.1", "Security procedures."),
            ("5.2", "Old authentication text."),
        ],
        &[
            ("4.3", "Registration management. See clause 5.1 for details."),
            ("4.3.1", "Initial registration procedure."),
            ("4.3.2", "Mobility registration update."),
            ("4.3.2.1", "Periodic update timer T3512."),
            ("5.1", "Security procedures."),
            ("5.3", "New service request text."),
        ],
    )
}

fn state_for(graph: Graph) -> Arc<ServerState> {
    Arc::new(ServerState::new(
        ServiceContext::new(graph, QueryConfig::default()),
        None,
        QueryConfig::default(),
    ))
}

async fn send(state: &Arc<ServerState>, request: Request<Body>) -> (StatusCode, Value) {
    let response = create_router(Arc::clone(state)).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let state = state_for(sample_graph());
    let (status, body) = send(&state, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["nodes"], 7);
    assert_eq!(body["edges"], 10);
}

#[tokio::test]
async fn test_query_returns_answer_and_highlight() {
    let state = state_for(sample_graph());
    let (status, body) = send(&state, post_json("/api/query", json!({"query": "Registration"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "matched");
    assert_eq!(body["highlight"], json!(["4.3", "4.3.1", "4.3.2"]));
    assert!(body["answer"].as_str().unwrap().starts_with("[4.3] "));
}

#[tokio::test]
async fn test_blank_query_is_a_user_facing_response() {
    let state = state_for(sample_graph());
    for request in [json!({"query": "   "}), json!({})] {
        let (status, body) = send(&state, post_json("/api/query", request)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "invalid_query");
        assert_eq!(body["answer"], INVALID_QUERY_MESSAGE);
        assert_eq!(body["highlight"], json!([]));
    }
}

#[tokio::test]
async fn test_query_without_matches() {
    let state = state_for(sample_graph());
    let (status, body) = send(&state, post_json("/api/query", json!({"query": "handover"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "no_results");
    assert_eq!(body["answer"], NO_RESULTS_MESSAGE);
}

#[tokio::test]
async fn test_graph_exposes_type_and_reason() {
    let state = state_for(sample_graph());
    let (status, body) = send(&state, get("/api/graph")).await;
    assert_eq!(status, StatusCode::OK);

    let nodes = body["nodes"].as_array().unwrap();
    let links = body["links"].as_array().unwrap();
    assert_eq!(nodes.len(), 7);
    assert_eq!(links.len(), 10);
    assert_eq!(
        nodes[0],
        json!({
            "id": "4.3",
            "type": "unchanged",
            "title": "Registration management. See clause 5.1 for details.",
            "source_version": "old",
        })
    );
    assert!(nodes.iter().any(|n| n["id"] == "5.3" && n["type"] == "added" && n["source_version"] == "new"));
    assert!(links
        .iter()
        .any(|l| l["source"] == "4.3" && l["target"] == "5.1" && l["reason"] == "cross-reference"));
}

#[tokio::test]
async fn test_search_ranks_hits() {
    let state = state_for(sample_graph());
    let (status, body) = send(&state, get("/api/search?q=periodic%20timer&limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    let hits = body.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["id"], "4.3.2.1");

    let (status, body) = send(&state, get("/api/search?q=registration&limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&state, get("/api/search?q=")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], INVALID_QUERY_MESSAGE);
}

#[tokio::test]
async fn test_impact_endpoint() {
    let state = state_for(sample_graph());
    let (status, body) = send(&state, get("/api/impact/5.1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["known"], true);
    assert_eq!(body["layers"][0], json!(["4.3", "5.2", "5.3"]));
    assert_eq!(
        body["impacted"],
        json!(["4.3", "5.2", "5.3", "4.3.1", "4.3.2", "4.3.2.1"])
    );

    let (status, body) = send(&state, get("/api/impact/9.9")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["known"], false);
    assert_eq!(body["impacted"], json!([]));
}

#[tokio::test]
async fn test_node_lookup() {
    let state = state_for(sample_graph());
    let (status, body) = send(&state, get("/api/nodes/4.3.2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["change_type"], "unchanged");
    assert_eq!(body["neighbors"]["children"], json!(["4.3.2.1"]));

    let (status, body) = send(&state, get("/api/nodes/9.9")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("9.9"));
}

#[tokio::test]
async fn test_changes_endpoint() {
    let state = state_for(sample_graph());
    let (status, body) = send(&state, get("/api/changes")).await;
    assert_eq!(status, StatusCode::OK);
    let keys: Vec<&str> = body.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["4.3.1", "5.2", "5.3"]);
}

#[tokio::test]
async fn test_reload_swaps_context_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.bin");
    save_graph(&sample_graph(), &path).unwrap();

    let state = Arc::new(ServerState::open(path.clone(), QueryConfig::default()).unwrap());
    let before = state.snapshot().await;
    assert_eq!(before.graph().node_count(), 7);

    save_graph(&graph(&[("1", "one"), ("2", "two")], &[]), &path).unwrap();
    let (status, body) = send(&state, post_json("/api/reload", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reloaded");
    assert_eq!(body["nodes"], 2);

    // a request that started before the swap keeps its snapshot
    assert_eq!(before.graph().node_count(), 7);
    assert!(before.engine().query("registration").unwrap().highlight.len() == 3);

    let (_, body) = send(&state, post_json("/api/query", json!({"query": "two"}))).await;
    assert_eq!(body["highlight"], json!(["2"]));
}

#[tokio::test]
async fn test_failed_reload_keeps_current_graph() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.bin");
    save_graph(&sample_graph(), &path).unwrap();
    let state = Arc::new(ServerState::open(path.clone(), QueryConfig::default()).unwrap());

    std::fs::write(&path, b"corrupt").unwrap();
    let (status, body) = send(&state, post_json("/api/reload", json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Failed to reload"));

    let (_, body) = send(&state, get("/api/health")).await;
    assert_eq!(body["nodes"], 7);
}

#[tokio::test]
async fn test_reload_without_graph_path_fails() {
    let state = state_for(sample_graph());
    let (status, _) = send(&state, post_json("/api/reload", json!({}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_open_refuses_missing_graph() {
    let dir = tempfile::tempdir().unwrap();
    let result = ServerState::open(dir.path().join("missing.bin"), QueryConfig::default());
    assert!(result.is_err());
}

//! Axum router setup for the SpecGraph server

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::{
    handlers::{
        get_changes, get_graph, get_impact, get_node, health_check, post_query, reload, search,
    },
    ServerState,
};

/// Create the axum router with all routes
pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/query", post(post_query))
        .route("/api/search", get(search))
        .route("/api/graph", get(get_graph))
        .route("/api/impact/:id", get(get_impact))
        .route("/api/nodes/:id", get(get_node))
        .route("/api/changes", get(get_changes))
        .route("/api/reload", post(reload))
        .route("/api/health", get(health_check))
        // The visualizer is served from another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}

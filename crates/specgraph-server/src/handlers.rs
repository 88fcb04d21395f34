//! REST API handlers for the SpecGraph server

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use specgraph_core::search::highlight::INVALID_QUERY_MESSAGE;
use specgraph_core::{
    export_changes, impact_layers, ChangeEntry, ChangeType, EdgeReason, GraphNode, QueryError,
    QueryResponse, SearchHit, SectionId, SourceVersion,
};

use crate::ServerState;

/// JSON error body with the status it is sent with.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InvalidQuery => Self::new(StatusCode::BAD_REQUEST, INVALID_QUERY_MESSAGE),
            QueryError::Internal(message) => {
                tracing::error!("Query failed: {}", message);
                Self::internal(message)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

/// Highlight query. Blank queries and empty result sets are normal 200 responses.
pub async fn post_query(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let context = state.snapshot().await;
    match context.engine().query(&request.query) {
        Ok(response) => Ok(Json(response)),
        Err(QueryError::InvalidQuery) => Ok(Json(QueryResponse::invalid_query())),
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// Ranked similarity search.
pub async fn search(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let context = state.snapshot().await;
    let hits = context.engine().search(&params.q, params.limit)?;
    Ok(Json(hits))
}

/// Graph in the shape the visualizer consumes
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphResponse {
    pub nodes: Vec<NodeResponse>,
    pub links: Vec<LinkResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeResponse {
    pub id: SectionId,
    /// Change type; drives node color and size.
    #[serde(rename = "type")]
    pub kind: ChangeType,
    pub title: String,
    pub source_version: SourceVersion,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinkResponse {
    pub source: SectionId,
    pub target: SectionId,
    pub reason: EdgeReason,
}

/// Get the current graph as JSON
pub async fn get_graph(State(state): State<Arc<ServerState>>) -> Json<GraphResponse> {
    let context = state.snapshot().await;
    let graph = context.graph();

    let nodes = graph
        .nodes()
        .map(|node| NodeResponse {
            id: node.id.clone(),
            kind: node.change_type,
            title: node.title.clone(),
            source_version: node.source_version,
        })
        .collect();
    let links = graph
        .edges()
        .map(|edge| LinkResponse {
            source: edge.source.clone(),
            target: edge.target.clone(),
            reason: edge.reason,
        })
        .collect();

    Json(GraphResponse { nodes, links })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImpactResponse {
    pub id: SectionId,
    /// False when the id is not in the graph; the impact lists are then empty.
    pub known: bool,
    pub layers: Vec<Vec<SectionId>>,
    pub impacted: Vec<SectionId>,
}

pub async fn get_impact(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Json<ImpactResponse> {
    let context = state.snapshot().await;
    let layers = impact_layers(context.graph(), &id);
    let impacted = layers.iter().flatten().cloned().collect();
    Json(ImpactResponse {
        known: context.graph().contains(&id),
        id: SectionId::new(id),
        layers,
        impacted,
    })
}

pub async fn get_node(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<GraphNode>, ApiError> {
    let context = state.snapshot().await;
    context
        .graph()
        .node(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("Unknown section {id}")))
}

pub async fn get_changes(
    State(state): State<Arc<ServerState>>,
) -> Json<BTreeMap<String, ChangeEntry>> {
    let context = state.snapshot().await;
    Json(export_changes(context.graph()))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub status: String,
    pub nodes: usize,
    pub edges: usize,
    pub loaded_at: String,
}

/// Reload the graph file. A failed reload leaves the active graph in place.
pub async fn reload(State(state): State<Arc<ServerState>>) -> Result<Json<ReloadResponse>, ApiError> {
    match state.reload().await {
        Ok(context) => Ok(Json(ReloadResponse {
            status: "reloaded".to_string(),
            nodes: context.graph().node_count(),
            edges: context.graph().edge_count(),
            loaded_at: context.loaded_at().to_string(),
        })),
        Err(e) => {
            tracing::error!("Reload failed, keeping current graph: {:#}", e);
            Err(ApiError::internal(format!("{e:#}")))
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub nodes: usize,
    pub edges: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    let context = state.snapshot().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        nodes: context.graph().node_count(),
        edges: context.graph().edge_count(),
    })
}

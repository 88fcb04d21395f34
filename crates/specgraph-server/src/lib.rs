//! HTTP query service over a loaded section graph
//!
//! Every request works against one immutable [`ServiceContext`]. Reloading builds a new
//! context off to the side and swaps it in atomically; requests already in flight keep
//! the snapshot they started with.

pub mod handlers;
pub mod router;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use specgraph_core::config::{QueryConfig, ServerSettings};
use specgraph_core::{load_graph, Graph, QueryEngine};
use tokio::sync::RwLock;

/// Bind address for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
        }
    }
}

/// A graph, its similarity index and where it came from.
#[derive(Debug)]
pub struct ServiceContext {
    engine: QueryEngine,
    loaded_at: String,
}

impl ServiceContext {
    pub fn new(graph: Graph, query: QueryConfig) -> Self {
        Self {
            engine: QueryEngine::new(graph, query),
            loaded_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Load a persisted graph and index it. Any load failure is returned, never a
    /// partially decoded context.
    pub fn load(path: &Path, query: QueryConfig) -> specgraph_core::Result<Self> {
        let graph = load_graph(path)?;
        Ok(Self::new(graph, query))
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn graph(&self) -> &Graph {
        self.engine.graph()
    }

    pub fn loaded_at(&self) -> &str {
        &self.loaded_at
    }
}

/// Shared server state: the active context plus what is needed to rebuild it.
pub struct ServerState {
    context: RwLock<Arc<ServiceContext>>,
    graph_path: Option<PathBuf>,
    query: QueryConfig,
}

impl ServerState {
    pub fn new(context: ServiceContext, graph_path: Option<PathBuf>, query: QueryConfig) -> Self {
        Self {
            context: RwLock::new(Arc::new(context)),
            graph_path,
            query,
        }
    }

    /// Load the initial context from `graph_path`. Fails when the graph is missing or
    /// inconsistent, so the server never starts without a valid graph.
    pub fn open(graph_path: PathBuf, query: QueryConfig) -> anyhow::Result<Self> {
        let context = ServiceContext::load(&graph_path, query.clone())
            .with_context(|| format!("Failed to load graph from {}", graph_path.display()))?;
        Ok(Self::new(context, Some(graph_path), query))
    }

    /// The context to serve the current request from.
    pub async fn snapshot(&self) -> Arc<ServiceContext> {
        Arc::clone(&*self.context.read().await)
    }

    /// Swap in a new context; returns the one it replaced.
    pub async fn replace(&self, context: ServiceContext) -> Arc<ServiceContext> {
        let next = Arc::new(context);
        let mut active = self.context.write().await;
        std::mem::replace(&mut *active, next)
    }

    /// Re-read the graph file and swap it in. On failure the current context stays active.
    pub async fn reload(&self) -> anyhow::Result<Arc<ServiceContext>> {
        let path = self
            .graph_path
            .clone()
            .context("No graph path configured; nothing to reload")?;
        let query = self.query.clone();

        let display = path.display().to_string();
        let context = tokio::task::spawn_blocking(move || ServiceContext::load(&path, query))
            .await
            .context("Reload task panicked")?
            .with_context(|| format!("Failed to reload graph from {display}"))?;

        self.replace(context).await;
        let current = self.snapshot().await;
        tracing::info!(
            "Reloaded graph: {} nodes, {} edges",
            current.graph().node_count(),
            current.graph().edge_count()
        );
        Ok(current)
    }
}

/// Main server struct
pub struct SpecGraphServer {
    state: Arc<ServerState>,
    config: ServerConfig,
}

impl SpecGraphServer {
    pub fn new(state: ServerState, config: ServerConfig) -> Self {
        Self {
            state: Arc::new(state),
            config,
        }
    }

    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Bind and serve until Ctrl-C.
    pub async fn start(self) -> anyhow::Result<()> {
        let ServerConfig { host, port } = &self.config;
        let listener = tokio::net::TcpListener::bind((host.as_str(), *port))
            .await
            .with_context(|| format!("Failed to bind {host}:{port}"))?;

        tracing::info!("SpecGraph server listening on http://{}", listener.local_addr()?);
        let app = router::create_router(self.state);
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

//! CLI command implementations

use std::path::Path;

use anyhow::Context;
use specgraph_ai::{create_summarizer, enrich_graph, EnrichmentOptions, ExplainRequest};
use specgraph_core::search::highlight::INVALID_QUERY_MESSAGE;
use specgraph_core::{
    clear_cache, impact_layers, load_graph, save_graph, write_changes_json, AppConfig,
    ChangeSummary, Graph, GraphBuilder, QueryEngine, QueryError, SectionIndex,
};
use specgraph_server::{ServerConfig, ServerState, SpecGraphServer};

fn open_graph(path: &Path) -> anyhow::Result<Graph> {
    load_graph(path).with_context(|| {
        format!(
            "Failed to load graph from {} (run `specgraph build` first)",
            path.display()
        )
    })
}

pub async fn build(config: &AppConfig, enrich: bool) -> anyhow::Result<()> {
    let paths = &config.paths;
    tracing::info!(
        "Comparing {} -> {}",
        paths.old.display(),
        paths.new.display()
    );

    let old = SectionIndex::load(&paths.old)
        .with_context(|| format!("Failed to read old snapshot {}", paths.old.display()))?;
    let new = SectionIndex::load(&paths.new)
        .with_context(|| format!("Failed to read new snapshot {}", paths.new.display()))?;

    let mut graph = GraphBuilder::new(config.linker.clone())
        .build(&old, &new)
        .context("Failed to build graph")?;

    if enrich || config.enrichment.enabled {
        let summarizer = create_summarizer(&config.enrichment)?;
        let options = EnrichmentOptions::from(&config.enrichment);
        let report = enrich_graph(&mut graph, summarizer.as_ref(), &options).await;
        println!(
            "Summaries: {} of {} sections ({} failed, {} skipped, {} tokens)",
            report.summarized, report.candidates, report.failed, report.skipped, report.tokens_used
        );
    }

    save_graph(&graph, &paths.graph).context("Failed to save graph")?;
    write_changes_json(&graph, &paths.changes).context("Failed to write change set")?;

    let summary = ChangeSummary::from_types(graph.nodes().map(|n| n.change_type));
    println!(
        "{} sections ({} added, {} removed, {} modified, {} unchanged), {} edges",
        summary.total(),
        summary.added,
        summary.removed,
        summary.modified,
        summary.unchanged,
        graph.edge_count()
    );
    println!("Graph saved to {}", paths.graph.display());
    Ok(())
}

pub async fn serve(config: &AppConfig) -> anyhow::Result<()> {
    let state = ServerState::open(config.paths.graph.clone(), config.query.clone())?;
    let server = SpecGraphServer::new(state, ServerConfig::from(&config.server));
    server.start().await
}

pub fn impact(config: &AppConfig, id: &str) -> anyhow::Result<()> {
    let graph = open_graph(&config.paths.graph)?;
    if !graph.contains(id) {
        println!("Section {id} is not in the graph");
        return Ok(());
    }

    let layers = impact_layers(&graph, id);
    if layers.is_empty() {
        println!("No other section is affected by {id}");
        return Ok(());
    }
    for (depth, layer) in layers.iter().enumerate() {
        let ids: Vec<&str> = layer.iter().map(|id| id.as_str()).collect();
        println!("{:>3}: {}", depth + 1, ids.join(", "));
    }
    Ok(())
}

pub fn query(config: &AppConfig, text: &str) -> anyhow::Result<()> {
    let graph = open_graph(&config.paths.graph)?;
    let engine = QueryEngine::new(graph, config.query.clone());
    match engine.query(text) {
        Ok(response) => {
            println!("{}", response.answer);
            Ok(())
        }
        Err(QueryError::InvalidQuery) => {
            println!("{INVALID_QUERY_MESSAGE}");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

pub fn search(config: &AppConfig, text: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let graph = open_graph(&config.paths.graph)?;
    let engine = QueryEngine::new(graph, config.query.clone());
    let hits = match engine.search(text, limit) {
        Ok(hits) => hits,
        Err(QueryError::InvalidQuery) => {
            println!("{INVALID_QUERY_MESSAGE}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    if hits.is_empty() {
        println!("No matching sections");
    }
    for hit in hits {
        println!("{:.3}  {:<12} [{}] {}", hit.score, hit.id, hit.change_type, hit.title);
    }
    Ok(())
}

pub async fn explain(config: &AppConfig, id: &str) -> anyhow::Result<()> {
    let graph = open_graph(&config.paths.graph)?;
    let request = ExplainRequest::for_section(&graph, id)
        .with_context(|| format!("Section {id} is not in the graph"))?;

    let summarizer = create_summarizer(&config.enrichment)?;
    tracing::debug!("Explaining {} with {}", id, summarizer.name());
    let explanation = summarizer.explain(&request).await?;
    println!("{}", explanation.text);
    Ok(())
}

pub fn export_changes(config: &AppConfig) -> anyhow::Result<()> {
    let graph = open_graph(&config.paths.graph)?;
    let count = write_changes_json(&graph, &config.paths.changes)?;
    println!("{} changed sections written to {}", count, config.paths.changes.display());
    Ok(())
}

pub fn clear(config: &AppConfig) -> anyhow::Result<()> {
    tracing::info!("Clearing saved graph and change set");
    clear_cache(&[config.paths.graph.as_path(), config.paths.changes.as_path()])?;
    tracing::info!("Cache cleared");
    Ok(())
}

//! SpecGraph CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use specgraph_core::{AppConfig, CONFIG_FILE_NAME};

mod commands;

#[derive(Parser)]
#[command(name = "specgraph")]
#[command(about = "Change-impact graph for versioned technical specifications", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file
    #[arg(short, long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two snapshots, build the graph and save it
    Build {
        /// Old version snapshot (JSON or YAML)
        #[arg(long)]
        old: Option<PathBuf>,

        /// New version snapshot (JSON or YAML)
        #[arg(long)]
        new: Option<PathBuf>,

        /// Where to save the graph (`.json` or bincode)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Where to write the change-set export
        #[arg(long)]
        changes: Option<PathBuf>,

        /// Attach summaries with the configured summarizer
        #[arg(long)]
        enrich: bool,
    },
    /// Serve the query API over HTTP
    Serve {
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },
    /// List sections affected by a change to one section
    Impact {
        id: String,

        #[arg(short, long)]
        graph: Option<PathBuf>,
    },
    /// Substring search with neighbor context
    Query {
        text: String,

        #[arg(short, long)]
        graph: Option<PathBuf>,
    },
    /// Ranked similarity search
    Search {
        text: String,

        /// Maximum number of hits
        #[arg(short, long)]
        limit: Option<usize>,

        #[arg(short, long)]
        graph: Option<PathBuf>,
    },
    /// Explain one section's change with the configured summarizer
    Explain {
        id: String,

        #[arg(short, long)]
        graph: Option<PathBuf>,
    },
    /// Rewrite the change-set export from a saved graph
    ExportChanges {
        #[arg(short, long)]
        graph: Option<PathBuf>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove the saved graph and change-set export
    Clear,
    /// Show version
    Version,
}

fn override_graph(config: &mut AppConfig, graph: Option<PathBuf>) {
    if let Some(graph) = graph {
        config.paths.graph = graph;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "specgraph={log_level},specgraph_core={log_level},specgraph_ai={log_level},specgraph_server={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // API keys may live in .env
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let mut config = AppConfig::load_or_default(&cli.config)?;
    tracing::debug!("SpecGraph v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Build {
            old,
            new,
            output,
            changes,
            enrich,
        } => {
            if let Some(old) = old {
                config.paths.old = old;
            }
            if let Some(new) = new {
                config.paths.new = new;
            }
            if let Some(changes) = changes {
                config.paths.changes = changes;
            }
            override_graph(&mut config, output);
            commands::build(&config, enrich).await
        }
        Commands::Serve { graph, port, host } => {
            override_graph(&mut config, graph);
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            commands::serve(&config).await
        }
        Commands::Impact { id, graph } => {
            override_graph(&mut config, graph);
            commands::impact(&config, &id)
        }
        Commands::Query { text, graph } => {
            override_graph(&mut config, graph);
            commands::query(&config, &text)
        }
        Commands::Search { text, limit, graph } => {
            override_graph(&mut config, graph);
            commands::search(&config, &text, limit)
        }
        Commands::Explain { id, graph } => {
            override_graph(&mut config, graph);
            commands::explain(&config, &id).await
        }
        Commands::ExportChanges { graph, output } => {
            override_graph(&mut config, graph);
            if let Some(output) = output {
                config.paths.changes = output;
            }
            commands::export_changes(&config)
        }
        Commands::Clear => commands::clear(&config),
        Commands::Version => {
            println!("SpecGraph v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

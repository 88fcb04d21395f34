//! Application configuration.
//!
//! Settings live in `specgraph.toml` next to the data. CLI flags override file values,
//! which override the defaults below. Secrets are read from the environment (`.env`
//! is loaded by the binary), never from the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpecGraphError};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "specgraph.toml";

/// Top-level config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub linker: LinkerConfig,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    #[serde(default)]
    pub server: ServerSettings,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Old document version, as an `id -> text` snapshot.
    #[serde(default = "default_old_snapshot")]
    pub old: PathBuf,

    /// New document version.
    #[serde(default = "default_new_snapshot")]
    pub new: PathBuf,

    /// Persisted graph. `.json` is written as JSON, anything else as bincode.
    #[serde(default = "default_graph_path")]
    pub graph: PathBuf,

    /// Change-set export.
    #[serde(default = "default_changes_path")]
    pub changes: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            old: default_old_snapshot(),
            new: default_new_snapshot(),
            graph: default_graph_path(),
            changes: default_changes_path(),
        }
    }
}

fn default_old_snapshot() -> PathBuf {
    PathBuf::from("data/old_sections.json")
}
fn default_new_snapshot() -> PathBuf {
    PathBuf::from("data/new_sections.json")
}
fn default_graph_path() -> PathBuf {
    PathBuf::from("data/unified_graph.bin")
}
fn default_changes_path() -> PathBuf {
    PathBuf::from("data/changes.json")
}

/// `[linker]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkerConfig {
    /// Minimum text similarity for pairing a renumbered section.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Try unique normalized titles before text similarity.
    #[serde(default = "default_true")]
    pub match_titles: bool,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            match_titles: true,
        }
    }
}

fn default_similarity_threshold() -> f32 {
    0.8
}
fn default_true() -> bool {
    true
}

/// `[query]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Neighbor snippets longer than this many characters are truncated.
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,

    /// Default number of ranked search hits.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            snippet_chars: default_snippet_chars(),
            search_limit: default_search_limit(),
        }
    }
}

fn default_snippet_chars() -> usize {
    300
}
fn default_search_limit() -> usize {
    10
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default)]
    pub enabled: bool,

    /// `openai` or `local`.
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Name of the env var holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Chat-completions compatible endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Attempts per node after the first failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Requests in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Skip sections whose change type is `unchanged`.
    #[serde(default = "default_true")]
    pub changed_only: bool,

    #[serde(default = "default_token_budget")]
    pub token_budget: u32,

    /// Completion cap sent with each summary request; also reserved from the budget.
    #[serde(default = "default_max_tokens_per_request")]
    pub max_tokens_per_request: u32,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            endpoint: default_endpoint(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            concurrency: default_concurrency(),
            changed_only: true,
            token_budget: default_token_budget(),
            max_tokens_per_request: default_max_tokens_per_request(),
        }
    }
}

fn default_provider() -> String {
    "local".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".into()
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_delay_ms() -> u64 {
    500
}
fn default_concurrency() -> usize {
    4
}
fn default_max_tokens_per_request() -> u32 {
    300
}
fn default_token_budget() -> u32 {
    100_000
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    7890
}

impl AppConfig {
    /// Parse config from a TOML string.
    pub fn from_toml(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| SpecGraphError::config(e.to_string()))
    }

    /// Load config from `path`, or defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| SpecGraphError::io(path, e))?;
        let config = Self::from_toml(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.linker.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SpecGraphError::config(format!(
                "linker.similarity_threshold must be within 0.0..=1.0, got {threshold}"
            )));
        }
        if self.enrichment.concurrency == 0 {
            return Err(SpecGraphError::config("enrichment.concurrency must be at least 1"));
        }
        if self.enrichment.max_tokens_per_request == 0 {
            return Err(SpecGraphError::config(
                "enrichment.max_tokens_per_request must be at least 1",
            ));
        }
        Ok(())
    }
}

//! Error types for graph construction, persistence and configuration.

use std::path::PathBuf;

/// Top-level error type for everything that can abort a build or a load.
#[derive(Debug, thiserror::Error)]
pub enum SpecGraphError {
    /// Malformed section snapshot or missing source document.
    #[error("input error: {message}")]
    Input { message: String },

    /// Graph file could not be encoded or decoded.
    #[error("persistence error at {path:?}: {message}")]
    Persist { path: PathBuf, message: String },

    /// Graph file decoded but violates the graph invariants.
    #[error("schema error: {message}")]
    Schema { message: String },

    /// Configuration file could not be parsed.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SpecGraphError>;

impl SpecGraphError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input {
            message: msg.into(),
        }
    }

    pub fn persist(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Persist {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with the path it happened at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the caller's input rather than the environment.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Input { .. })
    }
}

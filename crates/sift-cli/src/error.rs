//! Error types for the CLI application.

use crate::orchestrator::Phase;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Forum client error
    #[error("Forum error: {0}")]
    Forum(#[from] sift_forum::ForumError),

    /// Collection error
    #[error("Collection failed: {0}")]
    Collector(#[from] sift_collector::CollectorError),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] sift_store::StoreError),

    /// Summarizer or report error
    #[error("Summarizer error: {0}")]
    Summarizer(#[from] sift_summarizer::SummarizerError),

    /// Worker task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML rendering error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// Required environment variable is missing
    #[error("Missing environment variable: {0}")]
    MissingEnv(String),

    /// A run stopped before completing
    #[error("Run aborted during {phase}: {source}")]
    Aborted {
        /// Phase in progress when the run stopped
        phase: Phase,
        /// Cause
        #[source]
        source: Box<CliError>,
    },
}

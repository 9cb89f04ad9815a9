//! Error types for the Summarizer

use thiserror::Error;

/// Errors that can occur while producing or writing a report
#[derive(Error, Debug)]
pub enum SummarizerError {
    /// Configuration rejected by validation or parsing
    #[error("Configuration error: {0}")]
    Config(String),

    /// Report file could not be written
    #[error("Failed to write report {path}: {source}")]
    Write {
        /// Target path
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for the Summarizer
pub type Result<T> = std::result::Result<T, SummarizerError>;

//! Error types for collection

use thiserror::Error;

/// Errors that abort a collection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectorError {
    /// Permanent forum failure, propagated without retry
    #[error("Forum error: {0}")]
    Forum(String),

    /// Transient failure that persisted through every attempt
    #[error("Giving up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// Message of the final failure
        last_error: String,
    },
}

/// Result alias for collection
pub type Result<T> = std::result::Result<T, CollectorError>;

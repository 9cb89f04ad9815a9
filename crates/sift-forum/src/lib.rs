//! Sift Forum Layer
//!
//! Implementations of the `ForumSource` trait from `sift-domain`.
//!
//! # Sources
//!
//! - `RedditClient`: Reddit OAuth API (application-only client credentials)
//! - `MockForum`: scripted pages and comment trees for testing

#![warn(missing_docs)]

pub mod mock;
pub mod reddit;

use sift_domain::TransientError;
use thiserror::Error;

pub use mock::MockForum;
pub use reddit::{RedditClient, RedditCredentials};

/// Errors that can occur while talking to the forum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForumError {
    /// Request was throttled by the API
    #[error("Rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited {
        /// Seconds until the quota resets, when the API says so
        retry_after_secs: Option<u64>,
    },

    /// Transport-level failure (DNS, TLS, timeout, ...)
    #[error("Communication error: {0}")]
    Communication(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Status {
        /// Status code
        status: u16,
        /// Response body (possibly truncated)
        body: String,
    },

    /// Credentials missing from the environment
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Credentials rejected by the API
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Thread or forum does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

impl TransientError for ForumError {
    fn is_transient(&self) -> bool {
        matches!(self, ForumError::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rate_limits_are_transient() {
        assert!(ForumError::RateLimited { retry_after_secs: None }.is_transient());
        assert!(!ForumError::Communication("timeout".into()).is_transient());
        assert!(!ForumError::Status { status: 500, body: String::new() }.is_transient());
        assert!(!ForumError::NotFound("t3_x".into()).is_transient());
    }
}

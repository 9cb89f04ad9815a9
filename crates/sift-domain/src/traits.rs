//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and the services it
//! talks to. Implementations live in `sift-forum` and `sift-llm`.

use crate::{CommentNode, RawThread};
use std::fmt;

/// Classification of errors that are worth retrying
pub trait TransientError {
    /// Whether the failure is transient (e.g. rate limiting) and the call may succeed later
    fn is_transient(&self) -> bool;
}

/// One page request against the forum search API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Forum (subreddit) to search
    pub forum: String,

    /// Free-text search query
    pub query: String,

    /// Sort order (e.g. `relevance`, `new`)
    pub sort: String,

    /// Time window (e.g. `year`, `all`)
    pub time_window: String,

    /// Maximum number of results on this page
    pub limit: usize,

    /// Resume after this identifier; `None` starts from the beginning
    pub after: Option<String>,
}

/// Trait for reading threads and comment trees from the forum
///
/// Implemented by the infrastructure layer (sift-forum)
pub trait ForumSource {
    /// Error type for forum operations
    type Error: TransientError + fmt::Display;

    /// Fetch one page of search results, in source order
    ///
    /// An empty page signals the end of the results.
    fn search(&self, request: &SearchRequest) -> Result<Vec<RawThread>, Self::Error>;

    /// Fetch the top-level comment forest of a thread, placeholders included
    fn comment_forest(&self, thread_id: &str) -> Result<Vec<CommentNode>, Self::Error>;

    /// Load the comments hidden behind a placeholder
    ///
    /// The returned nodes replace the placeholder in place; they may contain
    /// further placeholders.
    fn expand_more(
        &self,
        thread_id: &str,
        children: &[String],
    ) -> Result<Vec<CommentNode>, Self::Error>;
}

/// A single chat-completion request
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model name
    pub model: String,

    /// Fixed instruction sent as the system message
    pub system_prompt: String,

    /// Text to analyze, already truncated to the input budget
    pub user_text: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Cap on generated tokens
    pub max_output_tokens: u32,
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (sift-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error: fmt::Display;

    /// Generate a completion for the request
    fn generate(&self, request: &CompletionRequest) -> Result<String, Self::Error>;
}

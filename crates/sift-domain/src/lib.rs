//! Sift Domain Layer
//!
//! Core data model and collaborator boundaries for the Sift ingestion and
//! report pipeline. Everything here is pure: no I/O, no async runtime.
//!
//! ## Key Concepts
//!
//! - **Thread**: a top-level forum submission (title, body, metadata)
//! - **Comment**: a reply attached to a thread, stored flattened
//! - **CommentNode**: the source's nested comment tree, including collapsed placeholders
//! - **Relevance**: keyword/length predicate deciding which threads are kept
//! - **Traits**: `ForumSource` and `LlmProvider`, implemented by infrastructure crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod relevance;
pub mod run;
pub mod thread;
pub mod traits;

// Re-exports for convenience
pub use relevance::{is_relevant, KeywordSets};
pub use run::RunId;
pub use thread::{Comment, CommentNode, RawThread, TextRow, Thread};
pub use traits::{CompletionRequest, ForumSource, LlmProvider, SearchRequest, TransientError};

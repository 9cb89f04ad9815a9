//! Sift Summarizer
//!
//! Formats stored thread/comment rows, groups them into chunks, asks the
//! completion provider for one summary per chunk, and writes the report.
//!
//! Failed chunks are logged and left out; a run where every chunk fails
//! produces an empty report rather than an error.
//!
//! # Example
//!
//! ```
//! use sift_domain::TextRow;
//! use sift_llm::MockProvider;
//! use sift_summarizer::{Summarizer, SummarizerConfig};
//! use std::sync::Arc;
//!
//! let llm = Arc::new(MockProvider::new("SUMMARY"));
//! let summarizer = Summarizer::new(llm, SummarizerConfig::default()).unwrap();
//! let rows = vec![TextRow {
//!     title: "Passed".to_string(),
//!     body: "Third attempt".to_string(),
//!     comment: None,
//! }];
//! assert_eq!(summarizer.summarize(&rows), "SUMMARY");
//! ```

#![warn(missing_docs)]

pub mod chunking;
pub mod config;
pub mod error;
pub mod report;
pub mod summarizer;

pub use chunking::RowChunker;
pub use config::{ChunkStrategy, SummarizerConfig};
pub use error::{Result, SummarizerError};
pub use report::write_report;
pub use summarizer::{Summarizer, Summary};

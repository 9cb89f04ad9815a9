//! Sift Collector
//!
//! Turns a forum into rows worth storing: paginated search with relevance
//! filtering, comment tree expansion, and the retry and metrics plumbing both
//! share.
//!
//! # Example
//!
//! ```
//! use sift_collector::{Collector, RunMetrics, SearchQuery};
//! use sift_domain::KeywordSets;
//! use sift_forum::MockForum;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(RunMetrics::new());
//! let keywords = KeywordSets::from_categories([("exam", vec!["passed"])]);
//! let collector = Collector::new(Arc::new(MockForum::new()), keywords, 10, metrics.clone());
//!
//! let query = SearchQuery {
//!     forum: "oscp".to_string(),
//!     query: "exam".to_string(),
//!     sort: "new".to_string(),
//!     time_window: "year".to_string(),
//!     page_size: 100,
//!     max_pages: 5,
//! };
//! assert!(collector.collect(&query).unwrap().is_empty());
//! assert_eq!(metrics.threads_processed(), 0);
//! ```

#![warn(missing_docs)]

pub mod collector;
pub mod comments;
pub mod error;
pub mod metrics;
pub mod retry;

pub use collector::{Collector, SearchQuery};
pub use comments::CommentExtractor;
pub use error::{CollectorError, Result};
pub use metrics::{MetricsSnapshot, RunMetrics};
pub use retry::{retry, RetryPolicy};

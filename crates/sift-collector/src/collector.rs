//! Paginated, relevance-filtered thread collection

use crate::error::Result;
use crate::metrics::RunMetrics;
use crate::retry::{retry, RetryPolicy};
use sift_domain::{is_relevant, ForumSource, KeywordSets, SearchRequest, Thread};
use std::sync::Arc;
use tracing::{debug, info};

/// What to search for and how far to page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Forum (subreddit) name
    pub forum: String,
    /// Search expression
    pub query: String,
    /// Sort order
    pub sort: String,
    /// Time window
    pub time_window: String,
    /// Results requested per page
    pub page_size: usize,
    /// Upper bound on pages fetched
    pub max_pages: usize,
}

/// Walks search result pages and keeps relevant threads
pub struct Collector<F> {
    forum: Arc<F>,
    keywords: KeywordSets,
    min_length: usize,
    retry_policy: RetryPolicy,
    metrics: Arc<RunMetrics>,
}

impl<F: ForumSource> Collector<F> {
    /// Create a collector with the default retry policy
    pub fn new(
        forum: Arc<F>,
        keywords: KeywordSets,
        min_length: usize,
        metrics: Arc<RunMetrics>,
    ) -> Self {
        Self {
            forum,
            keywords,
            min_length,
            retry_policy: RetryPolicy::default(),
            metrics,
        }
    }

    /// Override the retry policy for page fetches
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Collect relevant threads in page order
    ///
    /// Stops at `max_pages`, at an empty page, or at the first page where no
    /// thread passes the relevance filter. The cursor advances to the last
    /// raw result of each page, so filtered-out threads are never re-fetched.
    pub fn collect(&self, query: &SearchQuery) -> Result<Vec<Thread>> {
        let mut collected = Vec::new();
        let mut after: Option<String> = None;

        for page_number in 1..=query.max_pages {
            let request = SearchRequest {
                forum: query.forum.clone(),
                query: query.query.clone(),
                sort: query.sort.clone(),
                time_window: query.time_window.clone(),
                limit: query.page_size,
                after: after.clone(),
            };

            let page = retry(&self.retry_policy, || self.forum.search(&request))?;
            if page.is_empty() {
                debug!("Page {} is empty, end of results", page_number);
                break;
            }

            let next_cursor = page.last().map(|raw| raw.fullname.clone());
            let raw_count = page.len();
            let relevant: Vec<Thread> = page
                .into_iter()
                .map(|raw| raw.thread)
                .filter(|thread| is_relevant(thread, &self.keywords, self.min_length))
                .collect();

            debug!(
                "Page {}: {} of {} threads relevant",
                page_number,
                relevant.len(),
                raw_count
            );
            if relevant.is_empty() {
                info!("No relevant threads on page {}, stopping", page_number);
                break;
            }

            collected.extend(relevant);
            after = next_cursor;
        }

        self.metrics.add_threads(collected.len());
        info!("Collected {} relevant threads", collected.len());
        Ok(collected)
    }
}

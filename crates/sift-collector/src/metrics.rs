//! Per-run counters shared by worker tasks

use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters for one pipeline run
///
/// Shared behind an `Arc`; every update is a single atomic add, so concurrent
/// workers never lose increments.
#[derive(Debug, Default)]
pub struct RunMetrics {
    threads_processed: AtomicUsize,
    comments_analyzed: AtomicUsize,
}

/// Point-in-time copy of [`RunMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Relevant threads collected
    pub threads_processed: usize,
    /// Comments kept by the extractor
    pub comments_analyzed: usize,
}

impl RunMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Record collected threads
    pub fn add_threads(&self, count: usize) {
        self.threads_processed.fetch_add(count, Ordering::Relaxed);
    }

    /// Record extracted comments
    pub fn add_comments(&self, count: usize) {
        self.comments_analyzed.fetch_add(count, Ordering::Relaxed);
    }

    /// Relevant threads collected so far
    pub fn threads_processed(&self) -> usize {
        self.threads_processed.load(Ordering::Relaxed)
    }

    /// Comments extracted so far
    pub fn comments_analyzed(&self) -> usize {
        self.comments_analyzed.load(Ordering::Relaxed)
    }

    /// Copy the current values
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            threads_processed: self.threads_processed(),
            comments_analyzed: self.comments_analyzed(),
        }
    }

    /// One-line summary for the run log
    pub fn summary(&self) -> String {
        format!(
            "Threads processed: {}, comments analyzed: {}",
            self.threads_processed(),
            self.comments_analyzed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_metrics() {
        let metrics = RunMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = RunMetrics::new();
        metrics.add_threads(3);
        metrics.add_threads(4);
        metrics.add_comments(5);

        assert_eq!(metrics.threads_processed(), 7);
        assert_eq!(metrics.comments_analyzed(), 5);
        assert_eq!(metrics.summary(), "Threads processed: 7, comments analyzed: 5");
    }

    #[test]
    fn test_no_lost_updates_across_threads() {
        let metrics = Arc::new(RunMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.add_comments(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.comments_analyzed(), 8000);
    }
}

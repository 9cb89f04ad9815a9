//! Scripted forum for deterministic testing
//!
//! Search results are served as a list of pages; the `after` cursor selects
//! the page following the one whose last entry has that fullname.

use crate::ForumError;
use sift_domain::{CommentNode, ForumSource, RawThread, SearchRequest};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MockState {
    pages: Vec<Vec<RawThread>>,
    searches: Vec<SearchRequest>,
    search_failures: VecDeque<ForumError>,
    forests: HashMap<String, Vec<CommentNode>>,
    expansions: HashMap<String, Vec<CommentNode>>,
    failing_threads: HashSet<String>,
    failing_expansions: HashSet<String>,
    expand_calls: usize,
}

/// In-memory `ForumSource`
///
/// Clones share state, so a test can keep a handle while the collector owns
/// another.
///
/// # Examples
///
/// ```
/// use sift_forum::{ForumError, MockForum};
///
/// let forum = MockForum::new();
/// forum.fail_next_searches(2, ForumError::RateLimited { retry_after_secs: None });
/// assert_eq!(forum.search_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockForum {
    state: Arc<Mutex<MockState>>,
}

impl MockForum {
    /// Create an empty forum: every search returns an empty page
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page of search results
    pub fn add_page(&self, page: Vec<RawThread>) {
        self.state.lock().unwrap().pages.push(page);
    }

    /// Make the next `n` searches fail with `error`
    pub fn fail_next_searches(&self, n: usize, error: ForumError) {
        let mut state = self.state.lock().unwrap();
        for _ in 0..n {
            state.search_failures.push_back(error.clone());
        }
    }

    /// Set the top-level comment forest of a thread
    pub fn set_forest(&self, thread_id: impl Into<String>, forest: Vec<CommentNode>) {
        self.state.lock().unwrap().forests.insert(thread_id.into(), forest);
    }

    /// Set what a placeholder with these children expands to
    pub fn set_expansion(&self, children: &[&str], nodes: Vec<CommentNode>) {
        self.state
            .lock()
            .unwrap()
            .expansions
            .insert(children.join(","), nodes);
    }

    /// Make comment retrieval for a thread fail
    pub fn fail_thread(&self, thread_id: impl Into<String>) {
        self.state.lock().unwrap().failing_threads.insert(thread_id.into());
    }

    /// Make expansion of a placeholder with these children fail
    pub fn fail_expansion(&self, children: &[&str]) {
        self.state
            .lock()
            .unwrap()
            .failing_expansions
            .insert(children.join(","));
    }

    /// Number of search calls received, failed ones included
    pub fn search_count(&self) -> usize {
        self.state.lock().unwrap().searches.len()
    }

    /// Search requests received so far, in call order
    pub fn searches(&self) -> Vec<SearchRequest> {
        self.state.lock().unwrap().searches.clone()
    }

    /// Number of placeholder expansions requested
    pub fn expand_count(&self) -> usize {
        self.state.lock().unwrap().expand_calls
    }
}

impl ForumSource for MockForum {
    type Error = ForumError;

    fn search(&self, request: &SearchRequest) -> Result<Vec<RawThread>, Self::Error> {
        let mut state = self.state.lock().unwrap();
        state.searches.push(request.clone());

        if let Some(error) = state.search_failures.pop_front() {
            return Err(error);
        }

        let index = match &request.after {
            None => 0,
            Some(cursor) => match state
                .pages
                .iter()
                .position(|page| page.last().map(|t| &t.fullname) == Some(cursor))
            {
                Some(i) => i + 1,
                None => return Ok(Vec::new()),
            },
        };

        let mut page = state.pages.get(index).cloned().unwrap_or_default();
        page.truncate(request.limit.max(1));
        Ok(page)
    }

    fn comment_forest(&self, thread_id: &str) -> Result<Vec<CommentNode>, Self::Error> {
        let state = self.state.lock().unwrap();
        if state.failing_threads.contains(thread_id) {
            return Err(ForumError::Communication(format!("Mock failure for {}", thread_id)));
        }
        Ok(state.forests.get(thread_id).cloned().unwrap_or_default())
    }

    fn expand_more(
        &self,
        thread_id: &str,
        children: &[String],
    ) -> Result<Vec<CommentNode>, Self::Error> {
        let mut state = self.state.lock().unwrap();
        state.expand_calls += 1;

        let key = children.join(",");
        if state.failing_expansions.contains(&key) {
            return Err(ForumError::Communication(format!(
                "Mock expansion failure for {} ({})",
                thread_id, key
            )));
        }
        Ok(state.expansions.get(&key).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_domain::Thread;

    fn raw(id: &str) -> RawThread {
        RawThread::new(
            Thread {
                id: id.to_string(),
                title: id.to_string(),
                body: String::new(),
                url: String::new(),
                created_at: 0.0,
                score: 0,
                comment_count: 0,
            },
            format!("t3_{}", id),
        )
    }

    fn request(after: Option<&str>) -> SearchRequest {
        SearchRequest {
            forum: "test".to_string(),
            query: "q".to_string(),
            sort: "relevance".to_string(),
            time_window: "all".to_string(),
            limit: 100,
            after: after.map(String::from),
        }
    }

    #[test]
    fn test_pages_follow_cursor() {
        let forum = MockForum::new();
        forum.add_page(vec![raw("a"), raw("b")]);
        forum.add_page(vec![raw("c")]);

        assert_eq!(forum.search(&request(None)).unwrap().len(), 2);
        let second = forum.search(&request(Some("t3_b"))).unwrap();
        assert_eq!(second[0].thread.id, "c");
        assert!(forum.search(&request(Some("t3_c"))).unwrap().is_empty());
        assert!(forum.search(&request(Some("t3_zzz"))).unwrap().is_empty());
        assert_eq!(forum.search_count(), 4);
    }

    #[test]
    fn test_scripted_search_failures() {
        let forum = MockForum::new();
        forum.add_page(vec![raw("a")]);
        forum.fail_next_searches(1, ForumError::RateLimited { retry_after_secs: Some(1) });

        assert!(forum.search(&request(None)).is_err());
        assert_eq!(forum.search(&request(None)).unwrap().len(), 1);
    }

    #[test]
    fn test_thread_failure_and_expansion() {
        let forum = MockForum::new();
        forum.fail_thread("bad");
        let placeholder = CommentNode::More {
            id: "m".into(),
            children: vec![],
        };
        forum.set_expansion(&["x", "y"], vec![placeholder]);

        assert!(forum.comment_forest("bad").is_err());
        assert!(forum.comment_forest("unknown").unwrap().is_empty());

        let nodes = forum
            .expand_more("t", &["x".to_string(), "y".to_string()])
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(forum.expand_count(), 1);
    }
}

//! Comment tree expansion and flattening

use sift_domain::{Comment, CommentNode, ForumSource, Thread};
use std::collections::VecDeque;
use std::sync::Arc;

/// Expands collapsed placeholders and flattens a thread's comments
pub struct CommentExtractor<F> {
    forum: Arc<F>,
    expand_limit: Option<usize>,
    min_length: usize,
}

impl<F: ForumSource> CommentExtractor<F> {
    /// Create an extractor
    ///
    /// `expand_limit` caps how many placeholders are expanded per thread;
    /// `None` expands all of them. Comments shorter than `min_length`
    /// characters are dropped.
    pub fn new(forum: Arc<F>, expand_limit: Option<usize>, min_length: usize) -> Self {
        Self {
            forum,
            expand_limit,
            min_length,
        }
    }

    /// All kept comments of a thread, in depth-first pre-order
    ///
    /// Never fails: a forum error is logged and yields no comments.
    pub fn extract(&self, thread: &Thread) -> Vec<Comment> {
        match self.try_extract(&thread.id) {
            Ok(comments) => comments,
            Err(e) => {
                tracing::error!(thread_id = %thread.id, "Comment extraction failed: {}", e);
                Vec::new()
            }
        }
    }

    fn try_extract(&self, thread_id: &str) -> Result<Vec<Comment>, F::Error> {
        let mut forest = self.forum.comment_forest(thread_id)?;
        self.expand(thread_id, &mut forest)?;

        let mut flat = Vec::new();
        flatten(forest, &mut flat);
        let total = flat.len();
        flat.retain(|comment| comment.body.chars().count() >= self.min_length);

        tracing::debug!(thread_id, "Kept {} of {} comments", flat.len(), total);
        Ok(flat)
    }

    /// Replace placeholders breadth-first until none remain or the limit is hit
    ///
    /// Placeholders left over once the limit is reached are removed.
    fn expand(&self, thread_id: &str, forest: &mut Vec<CommentNode>) -> Result<(), F::Error> {
        let mut expanded = 0;
        loop {
            if self.expand_limit.is_some_and(|limit| expanded >= limit) {
                prune_placeholders(forest);
                return Ok(());
            }
            let Some(hidden) = take_first_placeholder(forest, thread_id, &*self.forum)? else {
                return Ok(());
            };
            expanded += 1;
            tracing::trace!(thread_id, "Expanded placeholder hiding {} comments", hidden);
        }
    }
}

/// Expand the shallowest, leftmost placeholder in place
///
/// Returns the number of ids it stood for, or `None` when there is none.
fn take_first_placeholder<F: ForumSource>(
    forest: &mut Vec<CommentNode>,
    thread_id: &str,
    forum: &F,
) -> Result<Option<usize>, F::Error> {
    let mut queue: VecDeque<&mut Vec<CommentNode>> = VecDeque::new();
    queue.push_back(forest);

    while let Some(level) = queue.pop_front() {
        let found = level.iter().enumerate().find_map(|(index, node)| match node {
            CommentNode::More { children, .. } => Some((index, children.clone())),
            CommentNode::Comment { .. } => None,
        });
        if let Some((index, children)) = found {
            let loaded = forum.expand_more(thread_id, &children)?;
            let _placeholder: Vec<_> = level.splice(index..=index, loaded).collect();
            return Ok(Some(children.len()));
        }
        for node in level {
            if let CommentNode::Comment { replies, .. } = node {
                queue.push_back(replies);
            }
        }
    }
    Ok(None)
}

fn prune_placeholders(nodes: &mut Vec<CommentNode>) {
    nodes.retain(|node| !node.is_placeholder());
    for node in nodes.iter_mut() {
        if let CommentNode::Comment { replies, .. } = node {
            prune_placeholders(replies);
        }
    }
}

fn flatten(nodes: Vec<CommentNode>, out: &mut Vec<Comment>) {
    for node in nodes {
        if let CommentNode::Comment { comment, replies } = node {
            out.push(comment);
            flatten(replies, out);
        }
    }
}

//! Threads, comments, and the rows the report is built from

/// A top-level forum submission
///
/// Threads are written once: a re-collected thread with an already stored id
/// is skipped, so `score` and `comment_count` reflect the first collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    /// Source-assigned identifier (primary key)
    pub id: String,

    /// Thread title
    pub title: String,

    /// Body text (may be empty for link posts)
    pub body: String,

    /// Permalink or linked URL
    pub url: String,

    /// Creation time in seconds since the Unix epoch
    pub created_at: f64,

    /// Score at collection time
    pub score: i64,

    /// Comment count reported by the source at collection time
    pub comment_count: i64,
}

/// A search hit as returned by the forum, before relevance filtering
#[derive(Debug, Clone, PartialEq)]
pub struct RawThread {
    /// The thread data
    pub thread: Thread,

    /// Opaque identifier used as the pagination cursor (e.g. `t3_abc123`)
    pub fullname: String,
}

impl RawThread {
    /// Wrap a thread with its pagination identifier
    pub fn new(thread: Thread, fullname: impl Into<String>) -> Self {
        Self {
            thread,
            fullname: fullname.into(),
        }
    }
}

/// A reply attached to a thread, stored flattened
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Source-assigned identifier (primary key)
    pub id: String,

    /// Identifier of the owning thread
    pub thread_id: String,

    /// Comment text
    pub body: String,

    /// Creation time in seconds since the Unix epoch
    pub created_at: f64,

    /// Score at collection time
    pub score: i64,
}

/// A node of the source's nested comment tree
#[derive(Debug, Clone, PartialEq)]
pub enum CommentNode {
    /// A loaded comment with its (possibly partial) replies
    Comment {
        /// The comment itself
        comment: Comment,
        /// Direct replies, in source order
        replies: Vec<CommentNode>,
    },

    /// A collapsed placeholder standing in for comments not yet loaded
    More {
        /// Placeholder identifier
        id: String,
        /// Identifiers of the comments hidden behind this placeholder
        children: Vec<String>,
    },
}

impl CommentNode {
    /// Leaf comment node without replies
    pub fn leaf(comment: Comment) -> Self {
        CommentNode::Comment {
            comment,
            replies: Vec::new(),
        }
    }

    /// Whether this node is a collapsed placeholder
    pub fn is_placeholder(&self) -> bool {
        matches!(self, CommentNode::More { .. })
    }
}

/// One row of the thread/comment join used to build the report
#[derive(Debug, Clone, PartialEq)]
pub struct TextRow {
    /// Thread title
    pub title: String,

    /// Thread body
    pub body: String,

    /// Comment body, absent for threads without stored comments
    pub comment: Option<String>,
}

impl TextRow {
    /// Render the row with the fixed report template
    ///
    /// # Examples
    ///
    /// ```
    /// use sift_domain::TextRow;
    ///
    /// let row = TextRow {
    ///     title: "Passed!".to_string(),
    ///     body: "Took 3 attempts".to_string(),
    ///     comment: Some("Congrats".to_string()),
    /// };
    /// assert_eq!(row.render(), "Thread: Passed!\nTook 3 attempts\nComment: Congrats\n");
    /// ```
    pub fn render(&self) -> String {
        format!(
            "Thread: {}\n{}\nComment: {}\n",
            self.title,
            self.body,
            self.comment.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_comment() {
        let row = TextRow {
            title: "t".to_string(),
            body: "b".to_string(),
            comment: None,
        };
        assert_eq!(row.render(), "Thread: t\nb\nComment: \n");
    }

    #[test]
    fn test_placeholder_detection() {
        let more = CommentNode::More {
            id: "m1".to_string(),
            children: vec!["c1".to_string()],
        };
        let leaf = CommentNode::leaf(Comment {
            id: "c0".to_string(),
            thread_id: "t".to_string(),
            body: "hi".to_string(),
            created_at: 0.0,
            score: 1,
        });
        assert!(more.is_placeholder());
        assert!(!leaf.is_placeholder());
    }
}

//! Relevance filter
//!
//! Decides whether a collected thread is worth keeping, based on named keyword
//! categories and a minimum body length.

use crate::Thread;
use std::collections::BTreeMap;

/// Named keyword categories (category name → keywords)
///
/// An optional allow-list restricts which categories participate; when it is
/// empty every category counts.
///
/// # Examples
///
/// ```
/// use sift_domain::KeywordSets;
///
/// let mut sets = KeywordSets::new();
/// sets.insert("technical_terms", ["Buffer Overflow", "pivoting"]);
/// assert!(sets.matches("a buffer overflow writeup"));
/// assert!(!sets.matches("nothing to see"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordSets {
    categories: BTreeMap<String, Vec<String>>,
    active: Vec<String>,
}

impl KeywordSets {
    /// Create an empty set of categories
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an iterator of `(category, keywords)` pairs
    pub fn from_categories<I, K, V, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sets = Self::new();
        for (name, keywords) in categories {
            sets.insert(name, keywords);
        }
        sets
    }

    /// Add (or replace) a category; keywords are stored lower-cased
    pub fn insert<K, V, S>(&mut self, name: K, keywords: V)
    where
        K: Into<String>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.into().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self.categories.insert(name.into(), keywords);
    }

    /// Restrict matching to the named categories
    pub fn with_active_categories<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active = names.into_iter().map(Into::into).collect();
        self
    }

    /// Total number of keywords across participating categories
    pub fn keyword_count(&self) -> usize {
        self.keywords().count()
    }

    /// Whether no keyword participates in matching
    pub fn is_empty(&self) -> bool {
        self.keyword_count() == 0
    }

    fn keywords(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .filter(|(name, _)| self.active.is_empty() || self.active.contains(name))
            .flat_map(|(_, keywords)| keywords.iter().map(String::as_str))
    }

    /// Whether any participating keyword occurs in `text` (case-insensitive)
    pub fn matches(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.keywords().any(|keyword| haystack.contains(keyword))
    }
}

/// Whether a thread is relevant
///
/// True iff the body is longer than `min_length` characters and at least one
/// participating keyword is a substring of the lower-cased `title + " " + body`.
pub fn is_relevant(thread: &Thread, keyword_sets: &KeywordSets, min_length: usize) -> bool {
    if thread.body.chars().count() <= min_length {
        return false;
    }
    keyword_sets.matches(&format!("{} {}", thread.title, thread.body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(title: &str, body: &str) -> Thread {
        Thread {
            id: "t1".to_string(),
            title: title.to_string(),
            body: body.to_string(),
            url: String::new(),
            created_at: 0.0,
            score: 0,
            comment_count: 0,
        }
    }

    fn sets() -> KeywordSets {
        KeywordSets::from_categories([
            ("technical_terms", vec!["buffer overflow", "Active Directory"]),
            ("exam", vec!["proctor"]),
        ])
    }

    #[test]
    fn test_keyword_in_body() {
        let t = thread("My notes", "Spent a week on active directory labs");
        assert!(is_relevant(&t, &sets(), 10));
    }

    #[test]
    fn test_keyword_in_title_only() {
        let t = thread("Buffer Overflow tips", "long enough body text here");
        assert!(is_relevant(&t, &sets(), 10));
    }

    #[test]
    fn test_body_too_short() {
        let t = thread("Buffer overflow", "short");
        assert!(!is_relevant(&t, &sets(), 10));
    }

    #[test]
    fn test_body_length_is_strict() {
        let t = thread("proctor", "exactly10!");
        assert!(!is_relevant(&t, &sets(), 10));
        let t = thread("proctor", "exactly11!!");
        assert!(is_relevant(&t, &sets(), 10));
    }

    #[test]
    fn test_no_keywords_is_false_not_error() {
        let t = thread("hello", "a long body with nothing of interest");
        assert!(!is_relevant(&t, &sets(), 0));
        assert!(!is_relevant(&t, &KeywordSets::new(), 0));
    }

    #[test]
    fn test_active_categories_restrict_matching() {
        let restricted = sets().with_active_categories(["technical_terms"]);
        let t = thread("proctor was late", "a long body with nothing else");
        assert!(is_relevant(&t, &sets(), 0));
        assert!(!is_relevant(&t, &restricted, 0));
    }

    #[test]
    fn test_length_counts_characters() {
        // 6 characters, 12 bytes
        let t = thread("proctor", "éééééé");
        assert!(!is_relevant(&t, &sets(), 6));
        assert!(is_relevant(&t, &sets(), 5));
    }

    #[test]
    fn test_keyword_count() {
        assert_eq!(sets().keyword_count(), 3);
        assert!(KeywordSets::new().is_empty());
    }
}

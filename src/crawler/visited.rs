//! The set of URLs discovered during one traversal
//!
//! The set only ever grows. It is owned by the traversal loop, so the
//! check-and-insert in [`VisitedSet::insert_if_absent`] cannot race.

use std::collections::HashSet;

/// Result of offering a URL to the visited set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    /// The URL was new and is now a member
    Inserted,

    /// The URL was already a member
    AlreadyPresent,

    /// The page cap is reached; the URL was not added
    Full,

    /// The URL is empty and can never be a member
    Rejected,
}

/// Visited URLs, optionally capped
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
    limit: Option<usize>,
}

impl VisitedSet {
    /// Creates an unbounded set
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set that refuses insertions once it holds `limit` URLs
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            urls: HashSet::new(),
            limit,
        }
    }

    /// Inserts `url` unless it is empty, already present, or the cap is reached
    pub fn insert_if_absent(&mut self, url: &str) -> Insertion {
        if url.is_empty() {
            return Insertion::Rejected;
        }
        if self.urls.contains(url) {
            return Insertion::AlreadyPresent;
        }
        if self.is_full() {
            return Insertion::Full;
        }

        self.urls.insert(url.to_string());
        Insertion::Inserted
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Returns true once the page cap is reached
    pub fn is_full(&self) -> bool {
        self.limit.map_or(false, |limit| self.urls.len() >= limit)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.urls.iter()
    }

    /// Members in lexicographic order
    pub fn sorted(&self) -> Vec<String> {
        let mut urls: Vec<String> = self.urls.iter().cloned().collect();
        urls.sort();
        urls
    }

    /// Consumes the set, returning its members in lexicographic order
    pub fn into_sorted_vec(self) -> Vec<String> {
        let mut urls: Vec<String> = self.urls.into_iter().collect();
        urls.sort();
        urls
    }
}

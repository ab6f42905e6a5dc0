use crate::url::normalize_url;
use std::collections::HashSet;

/// Tracks URLs already seen within one crawl session
///
/// Keys are normalized URL strings, so two spellings of the same article URL
/// (tracking parameters, query order, trailing slash) count as one entry.
/// The set is owned by a single session; listing pages are walked
/// sequentially, so no internal locking is needed.
#[derive(Debug, Default)]
pub struct SeenUrls {
    seen: HashSet<String>,
}

impl SeenUrls {
    /// Creates an empty seen-set
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a URL, returning true if it had not been seen before
    ///
    /// Unparseable URLs are treated as already-seen so callers skip them.
    pub fn insert(&mut self, url: &str) -> bool {
        match normalize_url(url) {
            Ok(normalized) => self.seen.insert(normalized.to_string()),
            Err(_) => false,
        }
    }

    /// Checks whether a URL has been seen, without recording it
    pub fn contains(&self, url: &str) -> bool {
        match normalize_url(url) {
            Ok(normalized) => self.seen.contains(normalized.as_str()),
            Err(_) => true,
        }
    }

    /// Number of distinct URLs recorded
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns true if no URLs have been recorded
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

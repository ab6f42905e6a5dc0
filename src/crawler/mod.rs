//! Crawl orchestration

mod session;

pub use session::CrawlSession;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Per-source counters for one crawl session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionResult {
    /// Article links found on listing pages, duplicates included
    pub found: usize,

    /// Articles newly ingested into the store
    pub new: usize,

    /// Links skipped because the store already held them
    pub duplicates: usize,

    /// Fetch failures during the article phase
    pub errors: usize,

    pub pages_crawled: u32,
}

/// Cooperative cancellation signal shared between a session and its owner
///
/// A session checks the flag between page fetches and between article
/// batches; an in-flight fetch is allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        CancellationFlag::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

//! Article and strategy persistence
//!
//! The store is the single source of truth for article workflow state and
//! for pagination strategies learned during crawling. Articles are keyed
//! by normalized URL so tracking-parameter variants collapse to one row.

mod memory;

pub use memory::MemoryStore;

use crate::extract::ExtractionQuality;
use crate::paginate::PaginatorState;
use crate::Metadata;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Article not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// A stored article and its workflow bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Normalized URL, the record's key
    pub url: String,

    /// Name of the source the article was discovered from
    pub source: String,

    pub title: Option<String>,

    /// Raw page HTML as fetched
    pub html: Option<String>,

    /// Extracted article text
    pub text: Option<String>,

    /// Workflow state name
    pub state: String,

    /// Message from the most recent failure, cleared on recovery
    pub error: Option<String>,

    pub retry_count: u32,

    #[serde(default)]
    pub metadata: Metadata,

    pub quality: Option<ExtractionQuality>,

    pub confidence: Option<f64>,

    pub word_count: Option<usize>,

    pub discovered_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl ArticleRecord {
    /// A freshly collected article in the initial workflow state
    pub fn collected(url: &str, source: &str) -> Self {
        let now = Utc::now();
        ArticleRecord {
            url: url.to_string(),
            source: source.to_string(),
            title: None,
            html: None,
            text: None,
            state: "collected".to_string(),
            error: None,
            retry_count: 0,
            metadata: Metadata::new(),
            quality: None,
            confidence: None,
            word_count: None,
            discovered_at: now,
            updated_at: now,
        }
    }
}

/// A pagination strategy that worked for a source, persisted for reuse
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnedStrategy {
    /// Concrete paginator snapshot
    pub paginator: PaginatorState,

    /// Pages crawled in the session that learned this strategy
    pub pages_crawled: u32,

    /// Sessions in which this strategy has produced new articles
    pub success_count: u32,

    pub last_success_at: DateTime<Utc>,
}

/// Whether a save created a new record or hit an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Duplicate,
}

/// Persistence backend for articles and learned strategies
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Saves a newly discovered article
    ///
    /// Returns `Duplicate` without modifying the existing record when the
    /// URL is already stored.
    async fn save_article(&self, record: ArticleRecord) -> Result<SaveOutcome, StorageError>;

    async fn get_article(&self, url: &str) -> Result<Option<ArticleRecord>, StorageError>;

    /// Replaces a stored article, refreshing `updated_at`
    async fn update_article(&self, record: ArticleRecord) -> Result<(), StorageError>;

    async fn contains(&self, url: &str) -> Result<bool, StorageError>;

    /// Articles currently in the named workflow state
    async fn list_in_state(&self, state: &str) -> Result<Vec<ArticleRecord>, StorageError>;

    async fn count(&self) -> Result<usize, StorageError>;

    async fn save_strategy(
        &self,
        source: &str,
        strategy: LearnedStrategy,
    ) -> Result<(), StorageError>;

    async fn load_strategy(&self, source: &str) -> Result<Option<LearnedStrategy>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collected_record_defaults() {
        let record = ArticleRecord::collected("https://example.com/news/a", "example");
        assert_eq!(record.state, "collected");
        assert_eq!(record.retry_count, 0);
        assert!(record.error.is_none());
        assert!(record.html.is_none());
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let mut record = ArticleRecord::collected("https://example.com/news/a", "example");
        record.quality = Some(ExtractionQuality::Good);
        record.metadata.insert("author".into(), serde_json::json!("Jane"));
        let json = serde_json::to_string(&record).unwrap();
        let parsed: ArticleRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.url, record.url);
        assert_eq!(parsed.quality, Some(ExtractionQuality::Good));
        assert_eq!(parsed.metadata["author"], "Jane");
    }
}

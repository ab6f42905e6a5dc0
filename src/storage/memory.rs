//! In-memory store

use super::{ArticleRecord, ArticleStore, LearnedStrategy, SaveOutcome, StorageError};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// HashMap-backed store for tests and single-shot runs
///
/// Nothing survives process exit. Articles are keyed by their URL as
/// given; callers are expected to normalize before storing.
#[derive(Default)]
pub struct MemoryStore {
    articles: RwLock<HashMap<String, ArticleRecord>>,
    strategies: RwLock<HashMap<String, LearnedStrategy>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn save_article(&self, record: ArticleRecord) -> Result<SaveOutcome, StorageError> {
        let mut articles = self.articles.write().await;
        if articles.contains_key(&record.url) {
            return Ok(SaveOutcome::Duplicate);
        }
        articles.insert(record.url.clone(), record);
        Ok(SaveOutcome::Inserted)
    }

    async fn get_article(&self, url: &str) -> Result<Option<ArticleRecord>, StorageError> {
        Ok(self.articles.read().await.get(url).cloned())
    }

    async fn update_article(&self, mut record: ArticleRecord) -> Result<(), StorageError> {
        record.updated_at = Utc::now();
        let mut articles = self.articles.write().await;
        if !articles.contains_key(&record.url) {
            return Err(StorageError::NotFound(record.url));
        }
        articles.insert(record.url.clone(), record);
        Ok(())
    }

    async fn contains(&self, url: &str) -> Result<bool, StorageError> {
        Ok(self.articles.read().await.contains_key(url))
    }

    async fn list_in_state(&self, state: &str) -> Result<Vec<ArticleRecord>, StorageError> {
        let articles = self.articles.read().await;
        let mut matching: Vec<ArticleRecord> = articles
            .values()
            .filter(|r| r.state == state)
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.discovered_at.cmp(&b.discovered_at));
        Ok(matching)
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.articles.read().await.len())
    }

    async fn save_strategy(
        &self,
        source: &str,
        strategy: LearnedStrategy,
    ) -> Result<(), StorageError> {
        self.strategies
            .write()
            .await
            .insert(source.to_string(), strategy);
        Ok(())
    }

    async fn load_strategy(&self, source: &str) -> Result<Option<LearnedStrategy>, StorageError> {
        Ok(self.strategies.read().await.get(source).cloned())
    }
}

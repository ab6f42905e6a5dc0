//! Article processing pipeline
//!
//! Drives one stored article from collected through extraction, optional
//! translation, scoring, and completion. Stage failures land the article
//! in the failed state with a reason; they never abort the caller.

use super::{ArticleState, ArticleStateMachine, HookRegistry, WorkflowError};
use crate::config::WorkflowConfig;
use crate::extract::{ContentExtractor, ExtractionQuality};
use crate::storage::{ArticleRecord, ArticleStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of an opaque processing stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Success,
    Failure(String),
}

/// Translation and scoring collaborators
///
/// Each stage mutates the record in place on success and reports failure
/// as an outcome rather than an error.
#[async_trait]
pub trait StageRunner: Send + Sync {
    async fn translate(&self, record: &mut ArticleRecord) -> StageOutcome;

    async fn score(&self, record: &mut ArticleRecord) -> StageOutcome;
}

/// Stage runner that accepts every article unchanged
pub struct NoopStages;

#[async_trait]
impl StageRunner for NoopStages {
    async fn translate(&self, _record: &mut ArticleRecord) -> StageOutcome {
        StageOutcome::Success
    }

    async fn score(&self, _record: &mut ArticleRecord) -> StageOutcome {
        StageOutcome::Success
    }
}

/// Runs the full processing workflow for one stored article
///
/// Articles already completed are returned as-is. Failed articles are
/// retried first when their budget allows; articles out of retries are
/// returned still failed. Returns the record as stored after the run.
pub async fn run_article_workflow(
    url: &str,
    store: Arc<dyn ArticleStore>,
    hooks: Arc<HookRegistry>,
    config: &WorkflowConfig,
    extractor: &dyn ContentExtractor,
    stages: &dyn StageRunner,
) -> Result<ArticleRecord, WorkflowError> {
    let record = store
        .get_article(url)
        .await?
        .ok_or_else(|| WorkflowError::MissingArticle(url.to_string()))?;

    let machine = ArticleStateMachine::from_record(
        &record,
        Arc::clone(&store),
        hooks,
        config.max_retries,
    )?;

    match machine.current_state().await {
        ArticleState::Completed => return Ok(record),
        ArticleState::Failed => {
            if !machine.retry().await? {
                warn!(url, "article out of retries, leaving failed");
                return reload(&store, url).await;
            }
        }
        ArticleState::Collected => {}
        other => {
            warn!(url, state = %other, "article mid-workflow, resetting");
            machine.reset().await?;
        }
    }

    machine
        .transition_to(ArticleState::Extracting, None, None, false)
        .await?;

    let html = match &record.html {
        Some(html) if !html.is_empty() => html.clone(),
        _ => {
            machine.fail("No HTML available for extraction").await?;
            return reload(&store, url).await;
        }
    };

    let extraction = extractor.extract(&html, url);
    if extraction.quality == ExtractionQuality::Failed {
        machine.fail("Content extraction produced no text").await?;
        return reload(&store, url).await;
    }

    let mut record = reload(&store, url).await?;
    record.title = extraction.title.clone().or(record.title);
    record.text = Some(extraction.text.clone());
    record.quality = Some(extraction.quality);
    record.confidence = Some(extraction.confidence);
    record.word_count = Some(extraction.word_count);
    for (key, value) in &extraction.metadata {
        record.metadata.insert(key.clone(), value.clone());
    }
    store.update_article(record).await?;

    machine
        .transition_to(ArticleState::Extracted, None, None, false)
        .await?;

    if config.translate {
        machine
            .transition_to(ArticleState::Translating, None, None, false)
            .await?;
        let mut record = reload(&store, url).await?;
        match stages.translate(&mut record).await {
            StageOutcome::Success => {
                store.update_article(record).await?;
                machine
                    .transition_to(ArticleState::Translated, None, None, false)
                    .await?;
            }
            StageOutcome::Failure(reason) => {
                machine.fail(&reason).await?;
                return reload(&store, url).await;
            }
        }
    }

    let current = reload(&store, url).await?;
    if current.text.as_deref().map(str::trim).unwrap_or("").is_empty() {
        machine
            .fail("No extracted text available for scoring")
            .await?;
        return reload(&store, url).await;
    }

    machine
        .transition_to(ArticleState::Scoring, None, None, false)
        .await?;
    let mut record = reload(&store, url).await?;
    match stages.score(&mut record).await {
        StageOutcome::Success => {
            store.update_article(record).await?;
            machine
                .transition_to(ArticleState::Scored, None, None, false)
                .await?;
        }
        StageOutcome::Failure(reason) => {
            machine.fail(&reason).await?;
            return reload(&store, url).await;
        }
    }

    machine
        .transition_to(ArticleState::Completed, None, None, false)
        .await?;
    info!(url, "article workflow completed");
    reload(&store, url).await
}

async fn reload(store: &Arc<dyn ArticleStore>, url: &str) -> Result<ArticleRecord, WorkflowError> {
    store
        .get_article(url)
        .await?
        .ok_or_else(|| WorkflowError::MissingArticle(url.to_string()))
}

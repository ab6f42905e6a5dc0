//! Per-article state machine
//!
//! Transitions are exclusive per article and atomic with respect to the
//! stored record: the store write happens before the in-memory commit, so
//! a storage failure leaves the machine in its previous state.

use super::{ArticleState, HookRegistry, TransitionContext, WorkflowError};
use crate::storage::ArticleStore;
use crate::Metadata;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// One entry in a machine's transition history
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: ArticleState,
    pub to: ArticleState,
    pub timestamp: DateTime<Utc>,

    /// False for transitions vetoed by a before-hook
    pub success: bool,

    pub error: Option<String>,

    pub metadata: Metadata,
}

struct Inner {
    state: ArticleState,
    error: Option<String>,
    retry_count: u32,
    history: Vec<StateTransition>,
}

/// Drives one article through its lifecycle
pub struct ArticleStateMachine {
    url: String,
    store: Arc<dyn ArticleStore>,
    hooks: Arc<HookRegistry>,
    max_retries: u32,
    inner: Mutex<Inner>,
}

impl ArticleStateMachine {
    /// A machine for a freshly collected article
    pub fn new(
        url: &str,
        store: Arc<dyn ArticleStore>,
        hooks: Arc<HookRegistry>,
        max_retries: u32,
    ) -> Self {
        ArticleStateMachine {
            url: url.to_string(),
            store,
            hooks,
            max_retries,
            inner: Mutex::new(Inner {
                state: ArticleState::Collected,
                error: None,
                retry_count: 0,
                history: Vec::new(),
            }),
        }
    }

    /// A machine resuming from a stored record's state
    pub fn from_record(
        record: &crate::storage::ArticleRecord,
        store: Arc<dyn ArticleStore>,
        hooks: Arc<HookRegistry>,
        max_retries: u32,
    ) -> Result<Self, WorkflowError> {
        let state: ArticleState = record
            .state
            .parse()
            .map_err(|_| WorkflowError::UnknownState(record.state.clone()))?;
        Ok(ArticleStateMachine {
            url: record.url.clone(),
            store,
            hooks,
            max_retries,
            inner: Mutex::new(Inner {
                state,
                error: record.error.clone(),
                retry_count: record.retry_count,
                history: Vec::new(),
            }),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn current_state(&self) -> ArticleState {
        self.inner.lock().await.state
    }

    pub async fn error(&self) -> Option<String> {
        self.inner.lock().await.error.clone()
    }

    pub async fn retry_count(&self) -> u32 {
        self.inner.lock().await.retry_count
    }

    pub async fn history(&self) -> Vec<StateTransition> {
        self.inner.lock().await.history.clone()
    }

    /// Transitions to `target`
    ///
    /// Fails with `InvalidTransition` when `target` is not reachable from
    /// the current state, unless `force` is set. A before-hook error
    /// vetoes the transition. On success the stored record is updated
    /// before the in-memory state changes.
    pub async fn transition_to(
        &self,
        target: ArticleState,
        error: Option<String>,
        metadata: Option<Metadata>,
        force: bool,
    ) -> Result<(), WorkflowError> {
        let mut inner = self.inner.lock().await;
        self.apply(&mut inner, target, error, metadata, force).await
    }

    /// Marks the article failed with a reason
    pub async fn fail(&self, reason: &str) -> Result<(), WorkflowError> {
        self.transition_to(ArticleState::Failed, Some(reason.to_string()), None, false)
            .await
    }

    /// Retries a failed article
    ///
    /// Returns `Ok(true)` and transitions back to collected when the
    /// current state is failed and the retry budget is not exhausted;
    /// `Ok(false)` otherwise, leaving everything unchanged.
    pub async fn retry(&self) -> Result<bool, WorkflowError> {
        let mut inner = self.inner.lock().await;
        if inner.state != ArticleState::Failed || inner.retry_count >= self.max_retries {
            return Ok(false);
        }
        self.apply(&mut inner, ArticleState::Collected, None, None, false)
            .await?;
        Ok(true)
    }

    /// Unconditionally returns to collected, clearing error, retry count,
    /// and history. Bypasses transition validation and hooks.
    pub async fn reset(&self) -> Result<(), WorkflowError> {
        let mut inner = self.inner.lock().await;
        self.persist(ArticleState::Collected, None, 0).await?;
        inner.state = ArticleState::Collected;
        inner.error = None;
        inner.retry_count = 0;
        inner.history.clear();
        Ok(())
    }

    async fn apply(
        &self,
        inner: &mut Inner,
        target: ArticleState,
        error: Option<String>,
        metadata: Option<Metadata>,
        force: bool,
    ) -> Result<(), WorkflowError> {
        let from = inner.state;

        if !force && !from.can_transition_to(target) {
            return Err(WorkflowError::InvalidTransition { from, to: target });
        }

        let ctx = TransitionContext {
            url: self.url.clone(),
            from,
            to: target,
            error: error.clone(),
            metadata: metadata.unwrap_or_default(),
        };

        if let Err(message) = self.hooks.run_before(&ctx) {
            inner.history.push(StateTransition {
                from,
                to: target,
                timestamp: Utc::now(),
                success: false,
                error: Some(message.clone()),
                metadata: ctx.metadata,
            });
            return Err(WorkflowError::HookAborted(message));
        }

        self.hooks.run_on_exit(&ctx);

        let (next_error, next_retry) = if target == ArticleState::Failed {
            (error.clone(), inner.retry_count + 1)
        } else {
            (None, inner.retry_count)
        };

        self.persist(target, next_error.clone(), next_retry).await?;

        inner.state = target;
        inner.error = next_error;
        inner.retry_count = next_retry;

        self.hooks.run_on_enter(&ctx);
        self.hooks.run_after(&ctx);

        inner.history.push(StateTransition {
            from,
            to: target,
            timestamp: Utc::now(),
            success: true,
            error,
            metadata: ctx.metadata,
        });

        debug!(url = %self.url, %from, to = %target, "article transitioned");
        Ok(())
    }

    /// Writes the new state to the stored record
    async fn persist(
        &self,
        state: ArticleState,
        error: Option<String>,
        retry_count: u32,
    ) -> Result<(), WorkflowError> {
        let mut record = self
            .store
            .get_article(&self.url)
            .await?
            .ok_or_else(|| WorkflowError::MissingArticle(self.url.clone()))?;
        record.state = state.as_str().to_string();
        record.error = error;
        record.retry_count = retry_count;
        self.store.update_article(record).await?;
        Ok(())
    }
}

//! Article lifecycle management
//!
//! A validated state machine per article, a shared hook registry for
//! cross-cutting side effects, and the pipeline that drives an article
//! from collected to completed.

mod hooks;
mod machine;
mod stages;
mod state;

pub use hooks::{HookRegistry, TransitionContext};
pub use machine::{ArticleStateMachine, StateTransition};
pub use stages::{run_article_workflow, NoopStages, StageOutcome, StageRunner};
pub use state::ArticleState;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition {
        from: ArticleState,
        to: ArticleState,
    },

    #[error("Transition aborted by hook: {0}")]
    HookAborted(String),

    #[error("Unknown article state: {0}")]
    UnknownState(String),

    #[error("Article not found in store: {0}")]
    MissingArticle(String),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
}

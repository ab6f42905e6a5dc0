//! State-transition hooks
//!
//! One registry is built at startup and shared by every state machine.
//! Before-hooks may veto a transition; all other phases are best-effort
//! and their failures are logged, never propagated.

use super::ArticleState;
use crate::Metadata;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// What a hook sees about the transition in progress
#[derive(Debug, Clone)]
pub struct TransitionContext {
    /// URL of the article being transitioned
    pub url: String,

    pub from: ArticleState,

    pub to: ArticleState,

    /// Error message accompanying a transition into the failed state
    pub error: Option<String>,

    pub metadata: Metadata,
}

type Hook = Arc<dyn Fn(&TransitionContext) -> Result<(), String> + Send + Sync>;

/// Registry of transition hooks, shared across state machines
#[derive(Default)]
pub struct HookRegistry {
    before: Vec<Hook>,
    after: Vec<Hook>,
    on_enter: HashMap<ArticleState, Vec<Hook>>,
    on_exit: HashMap<ArticleState, Vec<Hook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        HookRegistry::default()
    }

    /// Registers a hook that runs before every transition and may veto it
    /// by returning an error
    pub fn before<F>(&mut self, hook: F)
    where
        F: Fn(&TransitionContext) -> Result<(), String> + Send + Sync + 'static,
    {
        self.before.push(Arc::new(hook));
    }

    /// Registers a hook that runs after every committed transition
    pub fn after<F>(&mut self, hook: F)
    where
        F: Fn(&TransitionContext) -> Result<(), String> + Send + Sync + 'static,
    {
        self.after.push(Arc::new(hook));
    }

    /// Registers a hook that runs when `state` is entered
    pub fn on_enter<F>(&mut self, state: ArticleState, hook: F)
    where
        F: Fn(&TransitionContext) -> Result<(), String> + Send + Sync + 'static,
    {
        self.on_enter.entry(state).or_default().push(Arc::new(hook));
    }

    /// Registers a hook that runs when `state` is exited
    pub fn on_exit<F>(&mut self, state: ArticleState, hook: F)
    where
        F: Fn(&TransitionContext) -> Result<(), String> + Send + Sync + 'static,
    {
        self.on_exit.entry(state).or_default().push(Arc::new(hook));
    }

    /// Runs before-hooks; the first error vetoes the transition
    pub(crate) fn run_before(&self, ctx: &TransitionContext) -> Result<(), String> {
        for hook in &self.before {
            hook(ctx)?;
        }
        Ok(())
    }

    pub(crate) fn run_after(&self, ctx: &TransitionContext) {
        for hook in &self.after {
            if let Err(message) = hook(ctx) {
                warn!(url = %ctx.url, %message, "after-hook failed");
            }
        }
    }

    pub(crate) fn run_on_enter(&self, ctx: &TransitionContext) {
        if let Some(hooks) = self.on_enter.get(&ctx.to) {
            for hook in hooks {
                if let Err(message) = hook(ctx) {
                    warn!(url = %ctx.url, state = %ctx.to, %message, "on-enter hook failed");
                }
            }
        }
    }

    pub(crate) fn run_on_exit(&self, ctx: &TransitionContext) {
        if let Some(hooks) = self.on_exit.get(&ctx.from) {
            for hook in hooks {
                if let Err(message) = hook(ctx) {
                    warn!(url = %ctx.url, state = %ctx.from, %message, "on-exit hook failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ctx(from: ArticleState, to: ArticleState) -> TransitionContext {
        TransitionContext {
            url: "https://example.com/news/a".to_string(),
            from,
            to,
            error: None,
            metadata: Metadata::new(),
        }
    }

    #[test]
    fn test_before_hook_can_veto() {
        let mut registry = HookRegistry::new();
        registry.before(|_| Err("vetoed".to_string()));
        let result = registry.run_before(&ctx(ArticleState::Collected, ArticleState::Extracting));
        assert_eq!(result.unwrap_err(), "vetoed");
    }

    #[test]
    fn test_before_hooks_run_in_order_until_veto() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = HookRegistry::new();
        let counter = Arc::clone(&calls);
        registry.before(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        registry.before(|_| Err("stop".to_string()));
        let counter = Arc::clone(&calls);
        registry.before(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(registry
            .run_before(&ctx(ArticleState::Collected, ArticleState::Extracting))
            .is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_after_hook_failures_are_swallowed() {
        let mut registry = HookRegistry::new();
        registry.after(|_| Err("broken side effect".to_string()));
        registry.run_after(&ctx(ArticleState::Collected, ArticleState::Extracting));
    }

    #[test]
    fn test_enter_and_exit_hooks_match_state() {
        let entered = Arc::new(AtomicUsize::new(0));
        let exited = Arc::new(AtomicUsize::new(0));
        let mut registry = HookRegistry::new();

        let counter = Arc::clone(&entered);
        registry.on_enter(ArticleState::Extracting, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let counter = Arc::clone(&exited);
        registry.on_exit(ArticleState::Collected, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let context = ctx(ArticleState::Collected, ArticleState::Extracting);
        registry.run_on_exit(&context);
        registry.run_on_enter(&context);
        assert_eq!(entered.load(Ordering::SeqCst), 1);
        assert_eq!(exited.load(Ordering::SeqCst), 1);

        // Hooks for other states do not fire
        let other = ctx(ArticleState::Scoring, ArticleState::Scored);
        registry.run_on_exit(&other);
        registry.run_on_enter(&other);
        assert_eq!(entered.load(Ordering::SeqCst), 1);
        assert_eq!(exited.load(Ordering::SeqCst), 1);
    }
}

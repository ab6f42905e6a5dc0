//! Listing-page pagination strategies
//!
//! Each strategy knows how to produce the next listing URL from the
//! current one, optionally consulting the fetched HTML. Strategy state is
//! serializable so a learned strategy can be persisted between sessions.

mod adaptive;
mod next_link;
mod parameter;
mod path;

pub use adaptive::AdaptivePaginator;
pub use next_link::NextLinkPaginator;
pub use parameter::ParameterPaginator;
pub use path::PathPaginator;

use serde::{Deserialize, Serialize};
use url::Url;

/// Pagination strategy family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Increment a numeric query parameter
    Parameter,

    /// Substitute a page number into a path template
    Path,

    /// Follow a rel=next (or equivalent) link in the page HTML
    NextLink,

    /// Probe the page to pick one of the above
    Adaptive,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StrategyKind::Parameter => "parameter",
            StrategyKind::Path => "path",
            StrategyKind::NextLink => "next-link",
            StrategyKind::Adaptive => "adaptive",
        };
        write!(f, "{name}")
    }
}

/// Outcome of a single pagination step
#[derive(Debug, Clone)]
pub struct PaginationResult {
    /// URL of the next listing page; always set when `has_more` is true
    pub next_url: Option<Url>,

    /// Whether another page is believed to exist
    pub has_more: bool,

    /// Page number the paginator will be on after this step
    pub page: u32,
}

impl PaginationResult {
    /// The terminal "no further pages" step
    pub fn exhausted(page: u32) -> Self {
        PaginationResult {
            next_url: None,
            has_more: false,
            page,
        }
    }

    pub fn advance(next_url: Url, page: u32) -> Self {
        PaginationResult {
            next_url: Some(next_url),
            has_more: true,
            page,
        }
    }
}

/// Serializable snapshot of a paginator, for persistence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatorState {
    pub strategy: StrategyKind,

    /// Strategy-specific parameters (param name, path template, ...)
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// A pagination strategy
///
/// Implementations are stateful: each `next_page` call advances the
/// internal page counter, and `reset` returns to the starting page.
pub trait Paginator: Send {
    fn kind(&self) -> StrategyKind;

    /// Computes the next listing URL
    ///
    /// # Arguments
    ///
    /// * `current_url` - The listing URL just fetched
    /// * `html` - The fetched page body, when the strategy needs it
    fn next_page(&mut self, current_url: &Url, html: Option<&str>) -> PaginationResult;

    /// Returns to the configured starting page
    fn reset(&mut self);

    /// Snapshot for persistence as a learned strategy
    fn state(&self) -> PaginatorState;
}

/// Rebuilds a paginator from a persisted snapshot
pub fn from_state(state: &PaginatorState, max_pages: u32) -> Box<dyn Paginator> {
    match state.strategy {
        StrategyKind::Parameter => {
            let param = state
                .params
                .get("param-name")
                .and_then(|v| v.as_str())
                .unwrap_or("page")
                .to_string();
            let start = state
                .params
                .get("start-page")
                .and_then(|v| v.as_u64())
                .unwrap_or(1) as u32;
            Box::new(ParameterPaginator::new(param, start, max_pages))
        }
        StrategyKind::Path => {
            let template = state
                .params
                .get("path-template")
                .and_then(|v| v.as_str())
                .unwrap_or("/page/{page}/")
                .to_string();
            let start = state
                .params
                .get("start-page")
                .and_then(|v| v.as_u64())
                .unwrap_or(1) as u32;
            Box::new(PathPaginator::new(template, start, max_pages))
        }
        StrategyKind::NextLink => Box::new(NextLinkPaginator::new(max_pages)),
        StrategyKind::Adaptive => Box::new(AdaptivePaginator::new(max_pages)),
    }
}

//! Adaptive pagination
//!
//! Probes the first listing page once, picks a concrete strategy, and
//! delegates every subsequent step to it.

use super::{
    NextLinkPaginator, PaginationResult, Paginator, PaginatorState, ParameterPaginator,
    PathPaginator, StrategyKind,
};
use std::sync::OnceLock;
use tracing::debug;
use url::Url;

/// Query parameters recognized as page counters, in probe order
const PAGE_PARAM_CANDIDATES: &[&str] = &["page", "p", "pg", "paged"];

fn path_page_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| regex::Regex::new(r"/page/(\d+)").expect("path page pattern is valid"))
}

/// Detection runs once, on the first `next_page` call, and the choice is
/// kept for the rest of the session.
pub struct AdaptivePaginator {
    max_pages: u32,
    inner: Option<Box<dyn Paginator>>,
}

impl AdaptivePaginator {
    pub fn new(max_pages: u32) -> Self {
        AdaptivePaginator {
            max_pages,
            inner: None,
        }
    }

    /// The concrete strategy chosen by detection, if it has run
    pub fn detected_kind(&self) -> Option<StrategyKind> {
        self.inner.as_ref().map(|p| p.kind())
    }

    /// Picks a concrete strategy from the URL shape and page HTML
    ///
    /// Order: a recognized page query parameter, then a `/page/N` path
    /// segment, then a rel=next link in the HTML. Falls back to parameter
    /// pagination with `page` when nothing matches.
    fn detect(&self, current_url: &Url, html: Option<&str>) -> Box<dyn Paginator> {
        for candidate in PAGE_PARAM_CANDIDATES {
            let found = current_url
                .query_pairs()
                .find(|(k, _)| k == candidate)
                .and_then(|(_, v)| v.parse::<u32>().ok());
            if let Some(page) = found {
                debug!(param = candidate, page, "detected parameter pagination");
                return Box::new(ParameterPaginator::new(
                    candidate.to_string(),
                    page,
                    self.max_pages,
                ));
            }
        }

        if let Some(captures) = path_page_pattern().captures(current_url.path()) {
            if let Ok(page) = captures[1].parse::<u32>() {
                debug!(page, "detected path pagination");
                return Box::new(PathPaginator::new(
                    "/page/{page}/".to_string(),
                    page,
                    self.max_pages,
                ));
            }
        }

        if let Some(html) = html {
            if NextLinkPaginator::find_next_href(html).is_some() {
                debug!("detected next-link pagination");
                return Box::new(NextLinkPaginator::new(self.max_pages));
            }
        }

        debug!("no pagination markers found, defaulting to page parameter");
        Box::new(ParameterPaginator::new(
            "page".to_string(),
            1,
            self.max_pages,
        ))
    }
}

impl Paginator for AdaptivePaginator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Adaptive
    }

    fn next_page(&mut self, current_url: &Url, html: Option<&str>) -> PaginationResult {
        if self.inner.is_none() {
            self.inner = Some(self.detect(current_url, html));
        }
        match self.inner.as_mut() {
            Some(inner) => inner.next_page(current_url, html),
            None => PaginationResult::exhausted(1),
        }
    }

    fn reset(&mut self) {
        self.inner = None;
    }

    /// When detection has run, reports the concrete strategy so it can be
    /// persisted and reused directly next session
    fn state(&self) -> PaginatorState {
        match &self.inner {
            Some(inner) => inner.state(),
            None => PaginatorState {
                strategy: StrategyKind::Adaptive,
                params: serde_json::Map::new(),
            },
        }
    }
}

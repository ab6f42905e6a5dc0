//! Path-template pagination

use super::{PaginationResult, Paginator, PaginatorState, StrategyKind};
use std::sync::OnceLock;
use url::Url;

fn page_segment_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| regex::Regex::new(r"/page/\d+/?").expect("page segment pattern is valid"))
}

/// Pages by substituting a page number into a path template such as
/// `/page/{page}/` appended to the listing's base path
#[derive(Debug, Clone)]
pub struct PathPaginator {
    template: String,
    start_page: u32,
    current_page: u32,
    max_pages: u32,
}

impl PathPaginator {
    pub fn new(template: String, start_page: u32, max_pages: u32) -> Self {
        PathPaginator {
            template,
            start_page,
            current_page: start_page,
            max_pages,
        }
    }

    /// Builds the next URL by stripping any existing `/page/N/` segment
    /// from the current path and appending the filled-in template
    fn with_page(&self, url: &Url, page: u32) -> Option<Url> {
        let stripped = page_segment_pattern().replace(url.path(), "/");
        let base = stripped.trim_end_matches('/');
        let fill = self.template.replace("{page}", &page.to_string());
        let joined = if fill.starts_with('/') {
            format!("{base}{fill}")
        } else {
            format!("{base}/{fill}")
        };

        let mut next = url.clone();
        next.set_path(&joined);
        Some(next)
    }
}

impl Paginator for PathPaginator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Path
    }

    fn next_page(&mut self, current_url: &Url, _html: Option<&str>) -> PaginationResult {
        let next_page = self.current_page + 1;
        if next_page > self.max_pages {
            return PaginationResult::exhausted(self.current_page);
        }

        match self.with_page(current_url, next_page) {
            Some(next_url) => {
                self.current_page = next_page;
                PaginationResult::advance(next_url, next_page)
            }
            None => PaginationResult::exhausted(self.current_page),
        }
    }

    fn reset(&mut self) {
        self.current_page = self.start_page;
    }

    fn state(&self) -> PaginatorState {
        let mut params = serde_json::Map::new();
        params.insert("path-template".into(), serde_json::json!(self.template));
        params.insert("start-page".into(), serde_json::json!(self.start_page));
        PaginatorState {
            strategy: StrategyKind::Path,
            params,
        }
    }
}

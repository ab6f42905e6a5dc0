//! Query-parameter pagination

use super::{PaginationResult, Paginator, PaginatorState, StrategyKind};
use url::Url;

/// Pages by incrementing a numeric query parameter (`?page=2`, `?p=3`, ...)
#[derive(Debug, Clone)]
pub struct ParameterPaginator {
    param: String,
    start_page: u32,
    current_page: u32,
    max_pages: u32,
}

impl ParameterPaginator {
    pub fn new(param: String, start_page: u32, max_pages: u32) -> Self {
        ParameterPaginator {
            param,
            start_page,
            current_page: start_page,
            max_pages,
        }
    }

    /// Rewrites `url` so the page parameter carries `page`, preserving
    /// every other query pair in order
    fn with_page(&self, url: &Url, page: u32) -> Url {
        let mut next = url.clone();
        let others: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != self.param.as_str())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        next.query_pairs_mut()
            .clear()
            .extend_pairs(others.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .append_pair(&self.param, &page.to_string());
        next
    }
}

impl Paginator for ParameterPaginator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Parameter
    }

    fn next_page(&mut self, current_url: &Url, _html: Option<&str>) -> PaginationResult {
        let next_page = self.current_page + 1;
        if next_page > self.max_pages {
            return PaginationResult::exhausted(self.current_page);
        }

        self.current_page = next_page;
        PaginationResult::advance(self.with_page(current_url, next_page), next_page)
    }

    fn reset(&mut self) {
        self.current_page = self.start_page;
    }

    fn state(&self) -> PaginatorState {
        let mut params = serde_json::Map::new();
        params.insert("param-name".into(), serde_json::json!(self.param));
        params.insert("start-page".into(), serde_json::json!(self.start_page));
        PaginatorState {
            strategy: StrategyKind::Parameter,
            params,
        }
    }
}

//! Next-link pagination

use super::{PaginationResult, Paginator, PaginatorState, StrategyKind};
use scraper::{Html, Selector};
use url::Url;

/// CSS selectors tried in order when looking for a next-page link
const NEXT_SELECTORS: &[&str] = &[
    "link[rel=\"next\"]",
    "a[rel=\"next\"]",
    "a.next",
    "a.pagination-next",
    "li.next a",
];

/// Anchor texts recognized as "next page" across common site languages
const NEXT_PHRASES: &[&str] = &[
    "next",
    "next page",
    "older posts",
    "more",
    "następna",
    "dalej",
    "weiter",
    "suivant",
    "siguiente",
];

/// Pages by following the rel=next (or equivalent) link in the page HTML
#[derive(Debug, Clone)]
pub struct NextLinkPaginator {
    current_page: u32,
    max_pages: u32,
}

impl NextLinkPaginator {
    pub fn new(max_pages: u32) -> Self {
        NextLinkPaginator {
            current_page: 1,
            max_pages,
        }
    }

    /// Finds the next-page href in the document, if any
    pub fn find_next_href(html: &str) -> Option<String> {
        let document = Html::parse_document(html);

        for selector_str in NEXT_SELECTORS {
            let selector = match Selector::parse(selector_str) {
                Ok(s) => s,
                Err(_) => continue,
            };
            if let Some(element) = document.select(&selector).next() {
                if let Some(href) = element.value().attr("href") {
                    let href = href.trim();
                    if !href.is_empty() && href != "#" {
                        return Some(href.to_string());
                    }
                }
            }
        }

        // Fall back to anchor-text matching
        let anchors = Selector::parse("a[href]").ok()?;
        for element in document.select(&anchors) {
            let text = element.text().collect::<String>().trim().to_lowercase();
            if NEXT_PHRASES.iter().any(|phrase| text == *phrase) {
                if let Some(href) = element.value().attr("href") {
                    let href = href.trim();
                    if !href.is_empty() && href != "#" {
                        return Some(href.to_string());
                    }
                }
            }
        }

        None
    }
}

impl Paginator for NextLinkPaginator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NextLink
    }

    fn next_page(&mut self, current_url: &Url, html: Option<&str>) -> PaginationResult {
        let next_page = self.current_page + 1;
        if next_page > self.max_pages {
            return PaginationResult::exhausted(self.current_page);
        }

        let href = match html.and_then(Self::find_next_href) {
            Some(h) => h,
            None => return PaginationResult::exhausted(self.current_page),
        };

        match current_url.join(&href) {
            Ok(next_url) => {
                self.current_page = next_page;
                PaginationResult::advance(next_url, next_page)
            }
            Err(_) => PaginationResult::exhausted(self.current_page),
        }
    }

    fn reset(&mut self) {
        self.current_page = 1;
    }

    fn state(&self) -> PaginatorState {
        PaginatorState {
            strategy: StrategyKind::NextLink,
            params: serde_json::Map::new(),
        }
    }
}

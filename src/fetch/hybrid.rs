//! Hybrid HTTP-then-browser fetcher
//!
//! Tries plain HTTP first. When the response looks JavaScript-rendered
//! (too short, or carrying a known indicator string), the same URL is
//! re-fetched through the browser fetcher and the owning domain is
//! remembered as browser-required for the rest of the session, so later
//! fetches for that domain skip the HTTP attempt entirely.

use crate::fetch::{FetchResult, Fetcher, FetcherKind};
use crate::url::extract_domain;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use url::Url;

/// Indicator strings that mark a page as needing JavaScript, matched
/// case-insensitively against the fetched HTML
const DEFAULT_JS_INDICATORS: &[&str] = &[
    "please enable javascript",
    "you need to enable javascript",
    "javascript is required",
    "javascript is disabled",
    "<div id=\"root\"></div>",
    "<div id=\"app\"></div>",
    "<div id='root'></div>",
    "window.__nuxt__",
    "data-server-rendered=\"false\"",
];

/// HTTP-first fetcher with browser fallback for JS-rendered pages
pub struct HybridFetcher {
    http: Arc<dyn Fetcher>,
    browser: Option<Arc<dyn Fetcher>>,
    min_html_length: usize,
    js_indicators: Vec<String>,
    browser_domains: RwLock<HashSet<String>>,
}

impl HybridFetcher {
    /// Creates a hybrid fetcher over an HTTP fetcher and an optional
    /// browser fetcher
    pub fn new(http: Arc<dyn Fetcher>, browser: Option<Arc<dyn Fetcher>>) -> Self {
        Self {
            http,
            browser,
            min_html_length: 1000,
            js_indicators: DEFAULT_JS_INDICATORS.iter().map(|s| s.to_string()).collect(),
            browser_domains: RwLock::new(HashSet::new()),
        }
    }

    /// Overrides the minimum-length threshold for the JS-required judgment
    pub fn with_min_html_length(mut self, length: usize) -> Self {
        self.min_html_length = length;
        self
    }

    /// Replaces the JS indicator list
    pub fn with_js_indicators(mut self, indicators: Vec<String>) -> Self {
        self.js_indicators = indicators;
        self
    }

    /// Pre-marks a domain as browser-required (e.g. from source config or
    /// a previous session)
    pub fn mark_browser_required(&self, domain: &str) {
        self.browser_domains
            .write()
            .expect("browser domain set lock poisoned")
            .insert(domain.to_string());
    }

    /// Whether a domain has been marked browser-required this session
    pub fn is_browser_required(&self, domain: &str) -> bool {
        self.browser_domains
            .read()
            .expect("browser domain set lock poisoned")
            .contains(domain)
    }

    /// Domains marked browser-required so far, for cross-session persistence
    pub fn browser_required_domains(&self) -> Vec<String> {
        self.browser_domains
            .read()
            .expect("browser domain set lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Judges whether fetched HTML looks JavaScript-rendered
    fn needs_browser(&self, html: &str) -> bool {
        if html.len() < self.min_html_length {
            return true;
        }
        let lowered = html.to_lowercase();
        self.js_indicators
            .iter()
            .any(|indicator| lowered.contains(indicator.as_str()))
    }

    fn browser_if_available(&self) -> Option<&Arc<dyn Fetcher>> {
        self.browser.as_ref().filter(|b| b.is_available())
    }
}

#[async_trait]
impl Fetcher for HybridFetcher {
    fn kind(&self) -> FetcherKind {
        FetcherKind::Hybrid
    }

    async fn fetch(&self, url: &str, headers: Option<&HashMap<String, String>>) -> FetchResult {
        let domain = Url::parse(url).ok().and_then(|u| extract_domain(&u));

        // Known browser-required domains skip the HTTP attempt
        if let (Some(domain), Some(browser)) = (&domain, self.browser_if_available()) {
            if self.is_browser_required(domain) {
                return browser.fetch(url, headers).await;
            }
        }

        let http_result = self.http.fetch(url, headers).await;

        let looks_js_rendered = match &http_result.html {
            Some(html) => http_result.success() && self.needs_browser(html),
            None => false,
        };

        if !looks_js_rendered {
            return http_result;
        }

        if let Some(domain) = &domain {
            tracing::info!("Domain {} judged JavaScript-rendered", domain);
            self.mark_browser_required(domain);
        }

        match self.browser_if_available() {
            Some(browser) => {
                let browser_result = browser.fetch(url, headers).await;
                if browser_result.success() {
                    browser_result
                } else {
                    // Keep whatever HTTP gave us rather than nothing
                    let mut degraded = http_result;
                    degraded.note = Some(format!(
                        "JS-rendered page; browser fetch failed: {}",
                        browser_result
                            .error
                            .unwrap_or_else(|| "unknown error".to_string())
                    ));
                    degraded
                }
            }
            None => {
                let mut degraded = http_result;
                degraded.note =
                    Some("JS-rendered page; browser fetcher unavailable".to_string());
                degraded
            }
        }
    }
}

//! Page fetchers
//!
//! Three fetcher implementations sit behind the [`Fetcher`] trait:
//!
//! - [`HttpFetcher`]: plain reqwest with retry, per-domain rate limiting,
//!   and an SSRF pre-flight check
//! - [`BrowserFetcher`]: headless-browser rendering for JavaScript-heavy
//!   pages (behind the `browser` cargo feature)
//! - [`HybridFetcher`]: HTTP first, falling back to the browser when the
//!   response looks JavaScript-rendered, remembering the domain for the
//!   rest of the session
//!
//! Fetch failures are captured into [`FetchResult::error`], never raised as
//! errors, so callers can keep working through the remaining URLs.

mod browser;
mod http;
mod hybrid;
mod rate_limit;
mod ssrf;

pub use browser::BrowserFetcher;
pub use http::{HttpFetcher, HttpFetcherOptions};
pub use hybrid::HybridFetcher;
pub use rate_limit::RateLimiter;
pub use ssrf::check_url_target;

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::fmt;

/// Which fetcher implementation produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetcherKind {
    Http,
    Browser,
    Hybrid,
}

impl fmt::Display for FetcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Browser => write!(f, "browser"),
            Self::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Result of one fetch attempt
///
/// A fetch succeeded iff `html` is present and `error` is absent; every
/// other combination describes a failure the orchestrator can log and skip.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL that was requested
    pub url: String,

    /// Page HTML, if the fetch produced any
    pub html: Option<String>,

    /// HTTP status code, when a response was received
    pub status_code: Option<u16>,

    /// Final URL after redirects
    pub final_url: Option<String>,

    /// Failure description; None on success
    pub error: Option<String>,

    /// Which fetcher produced this result
    pub fetcher: FetcherKind,

    /// Wall-clock duration of the whole fetch call
    pub elapsed_ms: u64,

    /// Response headers, lowercased names
    pub headers: HashMap<String, String>,

    /// Degradation note, e.g. when a JS-rendered page could not be
    /// re-fetched through the browser
    pub note: Option<String>,
}

impl FetchResult {
    /// True iff the fetch produced HTML without an error
    pub fn success(&self) -> bool {
        self.html.is_some() && self.error.is_none()
    }

    /// Builds a failure result carrying only an error description
    pub fn failure(url: impl Into<String>, fetcher: FetcherKind, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: None,
            status_code: None,
            final_url: None,
            error: Some(error.into()),
            fetcher,
            elapsed_ms: 0,
            headers: HashMap::new(),
            note: None,
        }
    }
}

/// A pluggable page fetcher
///
/// `fetch_many` preserves input order and bounds parallelism; the default
/// implementation dispatches to `fetch` through an ordered buffered stream.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Which implementation this is
    fn kind(&self) -> FetcherKind;

    /// Whether this fetcher can actually produce pages right now
    fn is_available(&self) -> bool {
        true
    }

    /// Fetches a single URL, optionally with extra request headers
    async fn fetch(&self, url: &str, headers: Option<&HashMap<String, String>>) -> FetchResult;

    /// Fetches many URLs with bounded parallelism, preserving input order
    async fn fetch_many(&self, urls: &[String], max_concurrency: usize) -> Vec<FetchResult> {
        // Futures are collected up front; mapping lazily inside the stream
        // trips a higher-ranked lifetime error under async-trait.
        let futs: Vec<_> = urls.iter().map(|url| self.fetch(url, None)).collect();
        futures::stream::iter(futs)
            .buffered(max_concurrency.max(1))
            .collect()
            .await
    }
}

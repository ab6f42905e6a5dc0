//! HTTP fetcher
//!
//! Plain reqwest-based fetching with:
//! - a default header set (configurable User-Agent and Accept-Language)
//! - retry with exponential backoff on 429/500/502/503/504 and transient
//!   network failures
//! - per-domain rate limiting before every request
//! - an SSRF pre-flight check before any socket is opened, re-applied to
//!   every redirect hop the client is asked to follow

use crate::fetch::rate_limit::RateLimiter;
use crate::fetch::ssrf::{check_redirect_hop, check_url_target};
use crate::fetch::{FetchResult, Fetcher, FetcherKind};
use crate::url::extract_domain;
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Status codes retried with backoff
const RETRYABLE_STATUS: &[u16] = &[429, 500, 502, 503, 504];

/// Base delay for the exponential backoff schedule
const BACKOFF_BASE_MS: u64 = 500;

/// Options controlling the HTTP fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcherOptions {
    pub user_agent: String,
    pub accept_language: String,
    pub timeout: Duration,
    pub max_retries: u32,
    /// Skip the SSRF guard; only meaningful for tests against local servers
    pub allow_private_networks: bool,
}

impl Default for HttpFetcherOptions {
    fn default() -> Self {
        Self {
            user_agent: "KumoIngest/1.0 (+https://github.com/kumo-ingest)".to_string(),
            accept_language: "en-US,en;q=0.8".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            allow_private_networks: false,
        }
    }
}

/// Fetches pages over plain HTTP
pub struct HttpFetcher {
    client: Client,
    opts: HttpFetcherOptions,
    limiter: Arc<RateLimiter>,
}

impl HttpFetcher {
    /// Builds an HTTP fetcher sharing the given rate limiter
    ///
    /// # Returns
    ///
    /// * `Ok(HttpFetcher)` - Ready to fetch
    /// * `Err(reqwest::Error)` - Client construction failed
    pub fn new(
        opts: HttpFetcherOptions,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, reqwest::Error> {
        // The pre-flight check only sees the original URL, so every redirect
        // hop is validated again before the client follows it.
        let allow_private = opts.allow_private_networks;
        let redirect_policy = reqwest::redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > 10 {
                return attempt.error("too many redirects");
            }
            if !allow_private {
                if let Err(reason) = check_redirect_hop(attempt.url()) {
                    return attempt.error(reason);
                }
            }
            attempt.follow()
        });

        let client = Client::builder()
            .user_agent(opts.user_agent.clone())
            .timeout(opts.timeout)
            .connect_timeout(Duration::from_secs(10))
            .redirect(redirect_policy)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            opts,
            limiter,
        })
    }

    /// The rate limiter shared by this fetcher
    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    async fn fetch_with_retries(
        &self,
        url: &Url,
        domain: &str,
        headers: Option<&HashMap<String, String>>,
    ) -> FetchResult {
        let url_str = url.as_str().to_string();
        let started = Instant::now();
        let mut last_error = String::new();
        let mut last_status: Option<u16> = None;

        for attempt in 0..=self.opts.max_retries {
            if attempt > 0 {
                tokio::time::sleep(backoff_delay(attempt)).await;
            }

            self.limiter.acquire(domain).await;

            let mut request = self
                .client
                .get(url.clone())
                .header("Accept-Language", &self.opts.accept_language)
                .header(
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
                );
            if let Some(extra) = headers {
                for (name, value) in extra {
                    request = request.header(name, value);
                }
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    last_status = Some(status.as_u16());

                    if RETRYABLE_STATUS.contains(&status.as_u16()) {
                        last_error = format!("HTTP {}", status.as_u16());
                        tracing::debug!(
                            "Retryable status {} for {} (attempt {})",
                            status,
                            url_str,
                            attempt + 1
                        );
                        continue;
                    }

                    if !status.is_success() {
                        return FetchResult {
                            url: url_str,
                            html: None,
                            status_code: Some(status.as_u16()),
                            final_url: None,
                            error: Some(format!("HTTP {}", status.as_u16())),
                            fetcher: FetcherKind::Http,
                            elapsed_ms: started.elapsed().as_millis() as u64,
                            headers: HashMap::new(),
                            note: None,
                        };
                    }

                    let final_url = response.url().to_string();
                    let response_headers = collect_headers(response.headers());

                    return match response.text().await {
                        Ok(body) => FetchResult {
                            url: url_str,
                            html: Some(body),
                            status_code: Some(status.as_u16()),
                            final_url: Some(final_url),
                            error: None,
                            fetcher: FetcherKind::Http,
                            elapsed_ms: started.elapsed().as_millis() as u64,
                            headers: response_headers,
                            note: None,
                        },
                        Err(e) => FetchResult {
                            url: url_str,
                            html: None,
                            status_code: Some(status.as_u16()),
                            final_url: Some(final_url),
                            error: Some(format!("Failed to read body: {}", e)),
                            fetcher: FetcherKind::Http,
                            elapsed_ms: started.elapsed().as_millis() as u64,
                            headers: response_headers,
                            note: None,
                        },
                    };
                }
                Err(e) => {
                    last_error = if e.is_timeout() {
                        "Request timeout".to_string()
                    } else if e.is_connect() {
                        format!("Connection error: {}", e)
                    } else {
                        e.to_string()
                    };
                    tracing::debug!(
                        "Network error for {} (attempt {}): {}",
                        url_str,
                        attempt + 1,
                        last_error
                    );
                }
            }
        }

        FetchResult {
            url: url_str,
            html: None,
            status_code: last_status,
            final_url: None,
            error: Some(format!(
                "{} (after {} attempts)",
                last_error,
                self.opts.max_retries + 1
            )),
            fetcher: FetcherKind::Http,
            elapsed_ms: started.elapsed().as_millis() as u64,
            headers: HashMap::new(),
            note: None,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn kind(&self) -> FetcherKind {
        FetcherKind::Http
    }

    async fn fetch(&self, url: &str, headers: Option<&HashMap<String, String>>) -> FetchResult {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                return FetchResult::failure(
                    url,
                    FetcherKind::Http,
                    format!("Invalid URL: {}", e),
                )
            }
        };

        // Security failures are terminal for the URL, never retried
        if !self.opts.allow_private_networks {
            if let Err(reason) = check_url_target(&parsed).await {
                return FetchResult::failure(
                    url,
                    FetcherKind::Http,
                    format!("SSRF blocked: {}", reason),
                );
            }
        }

        let domain = match extract_domain(&parsed) {
            Some(d) => d,
            None => return FetchResult::failure(url, FetcherKind::Http, "URL has no host"),
        };

        self.fetch_with_retries(&parsed, &domain, headers).await
    }
}

/// Backoff for the given attempt number (1-based), with jitter
fn backoff_delay(attempt: u32) -> Duration {
    let base = BACKOFF_BASE_MS.saturating_mul(1 << (attempt - 1).min(6));
    let jitter = rand::thread_rng().gen_range(0..BACKOFF_BASE_MS / 2);
    Duration::from_millis(base + jitter)
}

fn collect_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_lowercase(), v.to_string()))
        })
        .collect()
}

//! Headless-browser fetcher
//!
//! Renders pages through chromiumoxide and returns the settled DOM, for
//! sites that build their content with JavaScript. Compiled in only with
//! the `browser` cargo feature; without it the fetcher still exists but
//! reports itself unavailable, and the hybrid fetcher degrades gracefully.
//!
//! Browser fetches are capped at a lower concurrency than HTTP fetches
//! because each page costs a renderer process.

use crate::fetch::{FetchResult, Fetcher, FetcherKind};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

#[cfg(feature = "browser")]
use std::time::Instant;

/// Fetches pages by rendering them in a headless browser
pub struct BrowserFetcher {
    semaphore: Arc<Semaphore>,
    #[allow(dead_code)]
    timeout: Duration,
    #[cfg(feature = "browser")]
    browser: tokio::sync::OnceCell<chromiumoxide::Browser>,
}

impl BrowserFetcher {
    /// Creates a browser fetcher with the given page-level concurrency cap
    pub fn new(max_concurrency: usize, timeout: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))),
            timeout,
            #[cfg(feature = "browser")]
            browser: tokio::sync::OnceCell::new(),
        }
    }

    #[cfg(feature = "browser")]
    async fn browser(&self) -> Result<&chromiumoxide::Browser, String> {
        use futures::StreamExt;

        self.browser
            .get_or_try_init(|| async {
                let config = chromiumoxide::BrowserConfig::builder()
                    .build()
                    .map_err(|e| format!("Browser config error: {}", e))?;
                let (browser, mut handler) = chromiumoxide::Browser::launch(config)
                    .await
                    .map_err(|e| format!("Browser launch failed: {}", e))?;

                // Drive the CDP event loop for the lifetime of the browser
                tokio::spawn(async move { while handler.next().await.is_some() {} });

                Ok(browser)
            })
            .await
    }

    #[cfg(feature = "browser")]
    async fn render(&self, url: &str) -> FetchResult {
        let started = Instant::now();

        let browser = match self.browser().await {
            Ok(b) => b,
            Err(e) => return FetchResult::failure(url, FetcherKind::Browser, e),
        };

        let rendered = tokio::time::timeout(self.timeout, async {
            let page = browser
                .new_page(url)
                .await
                .map_err(|e| format!("Page open failed: {}", e))?;
            // Wait for the network to go idle so client-rendered content settles
            page.wait_for_navigation()
                .await
                .map_err(|e| format!("Navigation failed: {}", e))?;
            let html = page
                .content()
                .await
                .map_err(|e| format!("Content read failed: {}", e))?;
            let _ = page.close().await;
            Ok::<String, String>(html)
        })
        .await;

        match rendered {
            Ok(Ok(html)) => FetchResult {
                url: url.to_string(),
                html: Some(html),
                status_code: None,
                final_url: Some(url.to_string()),
                error: None,
                fetcher: FetcherKind::Browser,
                elapsed_ms: started.elapsed().as_millis() as u64,
                headers: HashMap::new(),
                note: None,
            },
            Ok(Err(e)) => FetchResult::failure(url, FetcherKind::Browser, e),
            Err(_) => FetchResult::failure(url, FetcherKind::Browser, "Render timeout"),
        }
    }
}

#[async_trait]
impl Fetcher for BrowserFetcher {
    fn kind(&self) -> FetcherKind {
        FetcherKind::Browser
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "browser")
    }

    async fn fetch(&self, url: &str, _headers: Option<&HashMap<String, String>>) -> FetchResult {
        let _permit = match self.semaphore.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return FetchResult::failure(url, FetcherKind::Browser, "Browser fetcher shut down")
            }
        };

        #[cfg(feature = "browser")]
        {
            self.render(url).await
        }

        #[cfg(not(feature = "browser"))]
        {
            FetchResult::failure(
                url,
                FetcherKind::Browser,
                "Browser fetcher not available (built without the browser feature)",
            )
        }
    }
}

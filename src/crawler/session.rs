//! One crawl session over one source
//!
//! Listing pages are walked sequentially, since each page's content can
//! determine the next URL. Article bodies are fetched afterwards with
//! bounded parallelism. Network failures during the article phase are
//! counted and skipped; only a failed listing fetch on the first page
//! aborts the session.

use super::{CancellationFlag, SessionResult};
use crate::config::{PaginationKind, SourceConfig};
use crate::fetch::Fetcher;
use crate::links::{extract_links, filter_article_links, LinkRules};
use crate::paginate::{
    from_state, AdaptivePaginator, NextLinkPaginator, PaginationResult, Paginator,
    ParameterPaginator, PathPaginator, StrategyKind,
};
use crate::storage::{ArticleRecord, ArticleStore, LearnedStrategy, SaveOutcome};
use crate::url::{extract_domain, normalize_url, SeenUrls};
use crate::{IngestError, Result};
use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

pub struct CrawlSession {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn ArticleStore>,
    source: SourceConfig,
    max_concurrency: usize,
    cancel: CancellationFlag,
}

impl CrawlSession {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn ArticleStore>,
        source: SourceConfig,
        max_concurrency: usize,
    ) -> Self {
        CrawlSession {
            fetcher,
            store,
            source,
            max_concurrency: max_concurrency.max(1),
            cancel: CancellationFlag::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs the session to completion
    ///
    /// Cancellation stops the session between fetches and returns the
    /// counters accumulated so far.
    pub async fn run(&self) -> Result<SessionResult> {
        let base_url = Url::parse(&self.source.base_url)?;
        let domain = self
            .source
            .domain
            .clone()
            .or_else(|| extract_domain(&base_url));

        let mut paginator = self.select_paginator().await?;
        info!(
            source = %self.source.name,
            strategy = %paginator.kind(),
            "starting crawl session"
        );

        let mut result = SessionResult::default();
        let collected = self
            .walk_listing_pages(&base_url, domain.as_deref(), paginator.as_mut(), &mut result)
            .await?;

        self.ingest_articles(collected, &mut result).await;

        // A session that paginated successfully and produced new articles
        // teaches future sessions its strategy
        if result.pages_crawled >= 2 && result.new >= 1 {
            self.persist_strategy(paginator.as_ref(), &result).await;
        }

        info!(
            source = %self.source.name,
            found = result.found,
            new = result.new,
            duplicates = result.duplicates,
            errors = result.errors,
            pages = result.pages_crawled,
            "crawl session finished"
        );
        Ok(result)
    }

    /// Learned strategy first, then the configured one, then adaptive
    async fn select_paginator(&self) -> Result<Box<dyn Paginator>> {
        let pagination = &self.source.pagination;
        let max_pages = pagination.max_pages;

        if let Some(learned) = self.store.load_strategy(&self.source.name).await? {
            debug!(
                source = %self.source.name,
                strategy = %learned.paginator.strategy,
                "reusing learned pagination strategy"
            );
            return Ok(from_state(&learned.paginator, max_pages));
        }

        let paginator: Box<dyn Paginator> = match pagination.strategy {
            Some(PaginationKind::Parameter) => Box::new(ParameterPaginator::new(
                pagination.param_name.clone(),
                pagination.start_page,
                max_pages,
            )),
            Some(PaginationKind::Path) => {
                let template = pagination
                    .path_template
                    .clone()
                    .unwrap_or_else(|| "/page/{page}/".to_string());
                Box::new(PathPaginator::new(
                    template,
                    pagination.start_page,
                    max_pages,
                ))
            }
            Some(PaginationKind::NextLink) => Box::new(NextLinkPaginator::new(max_pages)),
            Some(PaginationKind::Adaptive) | None => Box::new(AdaptivePaginator::new(max_pages)),
        };
        Ok(paginator)
    }

    /// Walks listing pages and returns the new article URLs, normalized,
    /// in discovery order
    async fn walk_listing_pages(
        &self,
        base_url: &Url,
        domain: Option<&str>,
        paginator: &mut dyn Paginator,
        result: &mut SessionResult,
    ) -> Result<Vec<String>> {
        let rules = LinkRules {
            include: self.source.links.include.clone(),
            exclude: self.source.links.exclude.clone(),
            extensions: self.source.links.extensions.clone(),
        };

        let mut seen = SeenUrls::new();
        let mut collected: Vec<String> = Vec::new();
        let mut current_url = base_url.clone();

        loop {
            if self.cancel.is_cancelled() {
                info!(source = %self.source.name, "session cancelled during pagination");
                break;
            }

            let page = self
                .fetcher
                .fetch(current_url.as_str(), Some(&self.source.headers))
                .await;
            if !page.success() {
                let message = page
                    .error
                    .unwrap_or_else(|| "no response body".to_string());
                if result.pages_crawled == 0 {
                    return Err(IngestError::ListingFetch {
                        url: current_url.to_string(),
                        message,
                    });
                }
                // Deeper pages 404ing is the listing running out, not a
                // session failure
                debug!(
                    source = %self.source.name,
                    url = %current_url,
                    %message,
                    "listing page fetch failed, stopping pagination"
                );
                break;
            }
            result.pages_crawled += 1;

            let html = page.html.unwrap_or_default();
            let links = extract_links(&html, &current_url, domain);
            let articles = filter_article_links(links, Some(&rules));
            result.found += articles.len();

            let mut new_this_page = 0;
            for link in &articles {
                if seen.insert(&link.url) {
                    let normalized = match normalize_url(&link.url) {
                        Ok(u) => u.to_string(),
                        Err(_) => continue,
                    };
                    collected.push(normalized);
                    new_this_page += 1;
                }
            }
            debug!(
                source = %self.source.name,
                page = result.pages_crawled,
                found = articles.len(),
                new = new_this_page,
                "listing page processed"
            );

            // A later page yielding nothing unseen means the listing has
            // wrapped around; going deeper only repeats it
            if new_this_page == 0 && result.pages_crawled > 1 {
                break;
            }

            if let Some(cap) = self.source.max_articles {
                if collected.len() >= cap {
                    collected.truncate(cap);
                    break;
                }
            }

            let step: PaginationResult = paginator.next_page(&current_url, Some(&html));
            match step.next_url {
                Some(next) if step.has_more => current_url = next,
                _ => break,
            }
        }

        Ok(collected)
    }

    /// Fetches article bodies in bounded batches and stores new records
    async fn ingest_articles(&self, collected: Vec<String>, result: &mut SessionResult) {
        let mut to_fetch = Vec::new();
        for url in collected {
            match self.store.contains(&url).await {
                Ok(true) => result.duplicates += 1,
                Ok(false) => to_fetch.push(url),
                Err(error) => {
                    warn!(%url, %error, "duplicate check failed");
                    result.errors += 1;
                }
            }
        }

        for chunk in to_fetch.chunks(self.max_concurrency) {
            if self.cancel.is_cancelled() {
                info!(source = %self.source.name, "session cancelled during article fetches");
                return;
            }

            let fetches = futures::stream::iter(
                chunk
                    .iter()
                    .map(|url| self.fetcher.fetch(url, Some(&self.source.headers))),
            )
            .buffered(self.max_concurrency)
            .collect::<Vec<_>>()
            .await;

            for fetched in fetches {
                if !fetched.success() {
                    warn!(
                        url = %fetched.url,
                        error = fetched.error.as_deref().unwrap_or("no response body"),
                        "article fetch failed"
                    );
                    result.errors += 1;
                    continue;
                }

                let mut record = ArticleRecord::collected(&fetched.url, &self.source.name);
                record.html = fetched.html;
                match self.store.save_article(record).await {
                    Ok(SaveOutcome::Inserted) => result.new += 1,
                    Ok(SaveOutcome::Duplicate) => result.duplicates += 1,
                    Err(error) => {
                        warn!(url = %fetched.url, %error, "article save failed");
                        result.errors += 1;
                    }
                }
            }
        }
    }

    async fn persist_strategy(&self, paginator: &dyn Paginator, result: &SessionResult) {
        let state = paginator.state();
        if state.strategy == StrategyKind::Adaptive {
            return;
        }

        let success_count = match self.store.load_strategy(&self.source.name).await {
            Ok(Some(previous)) => previous.success_count + 1,
            _ => 1,
        };
        let learned = LearnedStrategy {
            paginator: state,
            pages_crawled: result.pages_crawled,
            success_count,
            last_success_at: Utc::now(),
        };
        if let Err(error) = self.store.save_strategy(&self.source.name, learned).await {
            warn!(source = %self.source.name, %error, "failed to persist learned strategy");
        }
    }
}

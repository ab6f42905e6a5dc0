//! Integration tests for the crawl-then-process pipeline

use kumo_ingest::config::{SourceConfig, WorkflowConfig};
use kumo_ingest::crawler::CrawlSession;
use kumo_ingest::extract::{ExtractionQuality, HybridExtractor};
use kumo_ingest::fetch::{Fetcher, HttpFetcher, HttpFetcherOptions, RateLimiter};
use kumo_ingest::storage::{ArticleStore, MemoryStore};
use kumo_ingest::workflow::{run_article_workflow, ArticleState, HookRegistry, NoopStages};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_fetcher() -> Arc<dyn Fetcher> {
    let opts = HttpFetcherOptions {
        user_agent: "TestBot/1.0".to_string(),
        accept_language: "en".to_string(),
        timeout: Duration::from_secs(5),
        max_retries: 0,
        allow_private_networks: true,
    };
    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(0)));
    Arc::new(HttpFetcher::new(opts, limiter).expect("client construction"))
}

fn test_source(base_url: &str) -> SourceConfig {
    let toml = format!(
        r#"
        name = "mock"
        base-url = "{base_url}"
        "#
    );
    toml::from_str(&toml).expect("source config")
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn full_article(title: &str, words: usize) -> String {
    format!(
        r#"<html><head>
            <title>{title}</title>
            <meta name="author" content="Jane Doe">
            <meta property="article:published_time" content="2026-08-01T10:00:00Z">
        </head><body>
            <article><h1>{title}</h1><p>{}</p></article>
        </body></html>"#,
        "word ".repeat(words).trim()
    )
}

#[tokio::test]
async fn test_crawled_articles_reach_completed() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/news",
        "<html><body><a href=\"/news/story-1\">A headline long enough</a></body></html>"
            .to_string(),
    )
    .await;
    mount_page(&server, "/news/story-1", full_article("Budget passes", 700)).await;

    let store = Arc::new(MemoryStore::new()) as Arc<dyn ArticleStore>;
    CrawlSession::new(
        test_fetcher(),
        Arc::clone(&store),
        test_source(&format!("{}/news", server.uri())),
        4,
    )
    .run()
    .await
    .expect("session");

    let pending = store.list_in_state("collected").await.unwrap();
    assert_eq!(pending.len(), 1);

    let extractor = HybridExtractor::new(ExtractionQuality::Fair);
    let config = WorkflowConfig::default();
    let hooks = Arc::new(HookRegistry::new());
    let record = run_article_workflow(
        &pending[0].url,
        Arc::clone(&store),
        hooks,
        &config,
        &extractor,
        &NoopStages,
    )
    .await
    .expect("workflow");

    assert_eq!(record.state, "completed");
    assert_eq!(record.title.as_deref(), Some("Budget passes"));
    assert_eq!(record.quality, Some(ExtractionQuality::Good));
    assert_eq!(record.metadata["author"], "Jane Doe");
    assert!(record.word_count.unwrap() >= 700);
}

#[tokio::test]
async fn test_thin_page_lands_in_failed_with_reason() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/news",
        "<html><body><a href=\"/news/story-1\">A headline long enough</a></body></html>"
            .to_string(),
    )
    .await;
    // No extractable content at all
    mount_page(
        &server,
        "/news/story-1",
        "<html><body><div>ad</div></body></html>".to_string(),
    )
    .await;

    let store = Arc::new(MemoryStore::new()) as Arc<dyn ArticleStore>;
    CrawlSession::new(
        test_fetcher(),
        Arc::clone(&store),
        test_source(&format!("{}/news", server.uri())),
        4,
    )
    .run()
    .await
    .expect("session");

    let pending = store.list_in_state("collected").await.unwrap();
    let extractor = HybridExtractor::new(ExtractionQuality::Fair);
    let record = run_article_workflow(
        &pending[0].url,
        Arc::clone(&store),
        Arc::new(HookRegistry::new()),
        &WorkflowConfig::default(),
        &extractor,
        &NoopStages,
    )
    .await
    .expect("workflow");

    assert_eq!(record.state, "failed");
    assert!(record.error.is_some());
    assert_eq!(record.retry_count, 1);
}

#[tokio::test]
async fn test_hooks_observe_every_transition() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/news",
        "<html><body><a href=\"/news/story-1\">A headline long enough</a></body></html>"
            .to_string(),
    )
    .await;
    mount_page(&server, "/news/story-1", full_article("Hooked", 500)).await;

    let store = Arc::new(MemoryStore::new()) as Arc<dyn ArticleStore>;
    CrawlSession::new(
        test_fetcher(),
        Arc::clone(&store),
        test_source(&format!("{}/news", server.uri())),
        4,
    )
    .run()
    .await
    .expect("session");

    let transitions = Arc::new(AtomicUsize::new(0));
    let completions = Arc::new(AtomicUsize::new(0));
    let mut hooks = HookRegistry::new();
    let counter = Arc::clone(&transitions);
    hooks.after(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let counter = Arc::clone(&completions);
    hooks.on_enter(ArticleState::Completed, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let pending = store.list_in_state("collected").await.unwrap();
    let extractor = HybridExtractor::new(ExtractionQuality::Fair);
    let record = run_article_workflow(
        &pending[0].url,
        Arc::clone(&store),
        Arc::new(hooks),
        &WorkflowConfig::default(),
        &extractor,
        &NoopStages,
    )
    .await
    .expect("workflow");

    assert_eq!(record.state, "completed");
    // collected -> extracting -> extracted -> scoring -> scored -> completed
    assert_eq!(transitions.load(Ordering::SeqCst), 5);
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

//! Integration tests for crawl sessions
//!
//! These tests use wiremock to stand in for real news sites and run the
//! full listing-walk and article-ingestion cycle end-to-end.

use kumo_ingest::config::SourceConfig;
use kumo_ingest::crawler::CrawlSession;
use kumo_ingest::fetch::{Fetcher, HttpFetcher, HttpFetcherOptions, RateLimiter};
use kumo_ingest::paginate::StrategyKind;
use kumo_ingest::storage::{ArticleStore, MemoryStore};
use kumo_ingest::IngestError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A fetcher wired for talking to a local mock server
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

fn test_source(name: &str, base_url: &str) -> SourceConfig {
    let toml = format!(
        r#"
        name = "{name}"
        base-url = "{base_url}"
        "#
    );
    toml::from_str(&toml).expect("source config")
}

fn listing_html(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!("<a href=\"{l}\">A headline long enough to read</a>"))
        .collect();
    format!("<html><body>{anchors}</body></html>")
}

fn article_html(title: &str) -> String {
    format!(
        "<html><head><title>{title}</title></head><body><article><p>{}</p></article></body></html>",
        "word ".repeat(400).trim()
    )
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

#[tokio::test]
async fn test_full_crawl_single_source() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/news",
        listing_html(&["/news/story-1", "/news/story-2"]),
    )
    .await;
    mount_page(&server, "/news/story-1", article_html("Story one")).await;
    mount_page(&server, "/news/story-2", article_html("Story two")).await;

    let store = Arc::new(MemoryStore::new());
    let session = CrawlSession::new(
        test_fetcher(),
        Arc::clone(&store) as Arc<dyn ArticleStore>,
        test_source("mock", &format!("{}/news", server.uri())),
        4,
    );

    let result = session.run().await.expect("session");
    assert_eq!(result.new, 2);
    assert_eq!(result.errors, 0);
    assert_eq!(store.count().await.unwrap(), 2);

    let stored = store
        .get_article(&format!("{}/news/story-1", server.uri()))
        .await
        .unwrap()
        .expect("stored article");
    assert_eq!(stored.state, "collected");
    assert!(stored.html.as_deref().unwrap_or("").contains("Story one"));
}

#[tokio::test]
async fn test_pagination_stops_on_repeated_links() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_html(&["/news/story-1", "/news/story-2"])),
        )
        .mount(&server)
        .await;

    // Page 2 repeats page 1 exactly
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_html(&["/news/story-1", "/news/story-2"])),
        )
        .mount(&server)
        .await;

    // Page 3 must never be requested
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&["/news/story-9"])))
        .expect(0)
        .mount(&server)
        .await;

    mount_page(&server, "/news/story-1", article_html("Story one")).await;
    mount_page(&server, "/news/story-2", article_html("Story two")).await;

    let store = Arc::new(MemoryStore::new());
    let session = CrawlSession::new(
        test_fetcher(),
        Arc::clone(&store) as Arc<dyn ArticleStore>,
        test_source("mock", &format!("{}/news?page=1", server.uri())),
        4,
    );

    let result = session.run().await.expect("session");
    assert_eq!(result.pages_crawled, 2);
    assert_eq!(result.new, 2);
}

#[tokio::test]
async fn test_learned_strategy_survives_sessions() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&["/news/story-1"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&["/news/story-2"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/news"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&["/news/story-2"])))
        .mount(&server)
        .await;
    mount_page(&server, "/news/story-1", article_html("Story one")).await;
    mount_page(&server, "/news/story-2", article_html("Story two")).await;

    let store = Arc::new(MemoryStore::new());
    let source = test_source("mock", &format!("{}/news?page=1", server.uri()));
    let result = CrawlSession::new(
        test_fetcher(),
        Arc::clone(&store) as Arc<dyn ArticleStore>,
        source.clone(),
        4,
    )
    .run()
    .await
    .expect("first session");
    assert!(result.pages_crawled >= 2);
    assert_eq!(result.new, 2);

    let learned = store
        .load_strategy("mock")
        .await
        .unwrap()
        .expect("learned strategy");
    assert_eq!(learned.paginator.strategy, StrategyKind::Parameter);

    // A second session replays the learned strategy and finds nothing new
    let result = CrawlSession::new(
        test_fetcher(),
        Arc::clone(&store) as Arc<dyn ArticleStore>,
        source,
        4,
    )
    .run()
    .await
    .expect("second session");
    assert_eq!(result.new, 0);
    assert_eq!(result.duplicates, 2);
}

#[tokio::test]
async fn test_unreachable_listing_fails_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/news"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let session = CrawlSession::new(
        test_fetcher(),
        store as Arc<dyn ArticleStore>,
        test_source("mock", &format!("{}/news", server.uri())),
        4,
    );

    let err = session.run().await.expect_err("listing failure");
    assert!(matches!(err, IngestError::ListingFetch { .. }));
}

#[tokio::test]
async fn test_broken_article_links_do_not_abort() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/news",
        listing_html(&["/news/story-1", "/news/gone"]),
    )
    .await;
    mount_page(&server, "/news/story-1", article_html("Story one")).await;
    Mock::given(method("GET"))
        .and(path("/news/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryStore::new());
    let session = CrawlSession::new(
        test_fetcher(),
        Arc::clone(&store) as Arc<dyn ArticleStore>,
        test_source("mock", &format!("{}/news", server.uri())),
        4,
    );

    let result = session.run().await.expect("session");
    assert_eq!(result.new, 1);
    assert_eq!(result.errors, 1);
    assert_eq!(store.count().await.unwrap(), 1);
}

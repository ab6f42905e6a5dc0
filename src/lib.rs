//! Kumo-Ingest: an article crawling and ingestion engine
//!
//! This crate crawls listing pages of heterogeneous news sources, extracts
//! clean article text with quality scoring, and drives each article through
//! a multi-stage processing workflow (extraction, translation, scoring,
//! completion) with retry semantics.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod fetch;
pub mod links;
pub mod paginate;
pub mod storage;
pub mod url;
pub mod workflow;

use thiserror::Error;

/// Loosely-structured metadata carried on fetch results, extraction results,
/// articles, and state transitions.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Main error type for Kumo-Ingest operations
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] workflow::WorkflowError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Listing page fetch failed for {url}: {message}")]
    ListingFetch { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Kumo-Ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CancellationFlag, CrawlSession, SessionResult};
pub use extract::{ExtractionQuality, ExtractionResult, HybridExtractor};
pub use fetch::{FetchResult, Fetcher, FetcherKind, RateLimiter};
pub use url::{extract_domain, normalize_url};
pub use workflow::{ArticleState, ArticleStateMachine, HookRegistry};

use crate::extract::ExtractionQuality;
use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure for the ingestion engine
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// Fetcher behavior configuration, shared by all sources
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Accept-Language header sent with every request
    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retry attempts for transient HTTP failures (429/5xx, timeouts)
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Default minimum delay between requests to one domain (milliseconds)
    #[serde(rename = "domain-delay-ms", default = "default_domain_delay_ms")]
    pub domain_delay_ms: u64,

    /// Maximum parallel article fetches over plain HTTP
    #[serde(rename = "max-concurrency", default = "default_http_concurrency")]
    pub max_concurrency: usize,

    /// Maximum parallel article fetches through the browser fetcher
    #[serde(
        rename = "browser-max-concurrency",
        default = "default_browser_concurrency"
    )]
    pub browser_max_concurrency: usize,

    /// HTML shorter than this many bytes is judged JavaScript-rendered
    #[serde(rename = "min-html-length", default = "default_min_html_length")]
    pub min_html_length: usize,

    /// Allow requests to private/loopback addresses (testing only)
    #[serde(rename = "allow-private-networks", default)]
    pub allow_private_networks: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept_language: default_accept_language(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            domain_delay_ms: default_domain_delay_ms(),
            max_concurrency: default_http_concurrency(),
            browser_max_concurrency: default_browser_concurrency(),
            min_html_length: default_min_html_length(),
            allow_private_networks: false,
        }
    }
}

/// Article-workflow configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Maximum retries before an article stays in the failed state
    #[serde(rename = "max-retries", default = "default_workflow_retries")]
    pub max_retries: u32,

    /// Whether the translation stage runs between extraction and scoring
    #[serde(default)]
    pub translate: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_retries: default_workflow_retries(),
            translate: false,
        }
    }
}

/// Per-source crawl configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Stable identifier for the source, used as the learned-strategy key
    pub name: String,

    /// Listing page where the crawl starts
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Restrict extracted links to this domain; derived from base-url if absent
    pub domain: Option<String>,

    /// Known to require browser rendering; skips the HTTP attempt entirely
    #[serde(rename = "requires-js", default)]
    pub requires_js: bool,

    /// Per-source override of the domain request delay (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: Option<u64>,

    /// Extra headers sent with every request to this source
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Cap on articles ingested in one session
    #[serde(rename = "max-articles")]
    pub max_articles: Option<usize>,

    /// Minimum acceptable extraction quality before the fallback engine runs
    #[serde(rename = "min-quality", default = "default_min_quality")]
    pub min_quality: ExtractionQuality,

    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub links: LinkRulesConfig,
}

/// Pagination strategy selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaginationKind {
    Parameter,
    Path,
    NextLink,
    Adaptive,
}

/// Pagination hints for a source
#[derive(Debug, Clone, Deserialize)]
pub struct PaginationConfig {
    /// Strategy to use; adaptive detection when absent
    pub strategy: Option<PaginationKind>,

    /// Query parameter incremented by the parameter strategy
    #[serde(rename = "param-name", default = "default_param_name")]
    pub param_name: String,

    /// Path template with a `{page}` placeholder, e.g. `/page/{page}/`
    #[serde(rename = "path-template")]
    pub path_template: Option<String>,

    /// First page number
    #[serde(rename = "start-page", default = "default_start_page")]
    pub start_page: u32,

    /// Maximum listing pages walked per session
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            strategy: None,
            param_name: default_param_name(),
            path_template: None,
            start_page: default_start_page(),
            max_pages: default_max_pages(),
        }
    }
}

/// Site-specific link filtering rules
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkRulesConfig {
    /// URL substrings that force-accept a link as an article
    #[serde(default)]
    pub include: Vec<String>,

    /// URL substrings that reject a link outright
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Required file extensions, e.g. `[".html"]`; empty accepts any
    #[serde(default)]
    pub extensions: Vec<String>,
}

fn default_user_agent() -> String {
    "KumoIngest/1.0 (+https://github.com/kumo-ingest)".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.8".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_domain_delay_ms() -> u64 {
    1000
}

fn default_http_concurrency() -> usize {
    5
}

fn default_browser_concurrency() -> usize {
    3
}

fn default_min_html_length() -> usize {
    1000
}

fn default_workflow_retries() -> u32 {
    3
}

fn default_param_name() -> String {
    "page".to_string()
}

fn default_start_page() -> u32 {
    1
}

fn default_max_pages() -> u32 {
    10
}

fn default_min_quality() -> ExtractionQuality {
    ExtractionQuality::Fair
}

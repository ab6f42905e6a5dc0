//! Link extraction and article filtering
//!
//! Parses listing-page HTML into candidate links, then scores each link's
//! likelihood of pointing at an article. Site-specific rules take
//! precedence; everything else goes through a default pattern-and-shape
//! heuristic.

use crate::url::{extract_domain, normalize_url};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// A candidate link pulled from a listing page
#[derive(Debug, Clone)]
pub struct ExtractedLink {
    /// Absolute URL
    pub url: String,

    /// Anchor text, trimmed; None when empty
    pub link_text: Option<String>,

    /// Surrounding context (title attribute), when present
    pub context: Option<String>,

    /// Whether the filter judged this an article link
    pub is_article: bool,

    /// Article-likelihood score in [0, 1]
    pub confidence: f64,
}

/// Site-specific filtering rules; applied before the default heuristics
#[derive(Debug, Clone, Default)]
pub struct LinkRules {
    /// URL substrings that force-accept a link with confidence 0.8
    pub include: Vec<String>,

    /// URL substrings that reject a link outright
    pub exclude: Vec<String>,

    /// Required URL-path extensions; empty accepts any
    pub extensions: Vec<String>,
}

/// URL path fragments that mark navigation, taxonomy, and asset links
const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    "/category/",
    "/categories/",
    "/tag/",
    "/tags/",
    "/topic/",
    "/author/",
    "/page/",
    "?page=",
    "/search",
    "/login",
    "/signin",
    "/register",
    "/subscribe",
    "/newsletter",
    "/about",
    "/contact",
    "/privacy",
    "/terms",
    "/feed",
    "/rss",
    ".css",
    ".js",
    ".json",
    ".png",
    ".jpg",
    ".jpeg",
    ".gif",
    ".svg",
    ".ico",
    ".pdf",
    ".zip",
    ".xml",
];

/// URL path fragments that strongly suggest an article page
const DEFAULT_INCLUDE_PATTERNS: &[&str] = &[
    "/article/",
    "/articles/",
    "/news/",
    "/story/",
    "/stories/",
    "/post/",
    "/posts/",
    "/blog/",
    "/politics/",
    "/world/",
    "/opinion/",
];

/// Confidence a link must reach to be accepted by the default heuristic
const ACCEPT_THRESHOLD: f64 = 0.4;

fn date_path_pattern() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"/\d{4}/\d{1,2}/").expect("date path pattern is valid")
    })
}

/// Extracts candidate links from listing-page HTML
///
/// Resolves relative hrefs against `base_url`, keeps only http(s) targets,
/// optionally restricts to one domain, and de-duplicates by normalized
/// absolute URL (first occurrence wins, preserving page order).
///
/// # Arguments
///
/// * `html` - The listing page HTML
/// * `base_url` - Base for resolving relative links
/// * `domain` - When set, links to other domains are dropped
pub fn extract_links(html: &str, base_url: &Url, domain: Option<&str>) -> Vec<ExtractedLink> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let anchor_selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return links,
    };

    for element in document.select(&anchor_selector) {
        let href = match element.value().attr("href") {
            Some(h) => h.trim(),
            None => continue,
        };

        let absolute = match resolve_href(href, base_url) {
            Some(u) => u,
            None => continue,
        };

        if let Some(required_domain) = domain {
            match extract_domain(&absolute) {
                Some(d) if d == required_domain => {}
                _ => continue,
            }
        }

        let dedup_key = match normalize_url(absolute.as_str()) {
            Ok(n) => n.to_string(),
            Err(_) => continue,
        };
        if !seen.insert(dedup_key) {
            continue;
        }

        let text = element.text().collect::<String>().trim().to_string();
        let context = element
            .value()
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);

        links.push(ExtractedLink {
            url: absolute.to_string(),
            link_text: if text.is_empty() { None } else { Some(text) },
            context,
            is_article: false,
            confidence: 0.0,
        });
    }

    links
}

/// Resolves an href to an absolute http(s) URL, or rejects it
fn resolve_href(href: &str, base_url: &Url) -> Option<Url> {
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    if absolute.scheme() == "http" || absolute.scheme() == "https" {
        Some(absolute)
    } else {
        None
    }
}

/// Filters candidate links down to probable article links
///
/// Site-specific `rules` are applied first: excluded substrings and missing
/// required extensions reject immediately; a custom include match accepts
/// unconditionally with confidence 0.8. Remaining links go through the
/// default scoring: base 0.3, +0.4 for a default include pattern, +0.2 for
/// a path of at least two segments, +0.1 for anchor text longer than 30
/// characters; accepted at 0.4 or higher.
pub fn filter_article_links(
    links: Vec<ExtractedLink>,
    rules: Option<&LinkRules>,
) -> Vec<ExtractedLink> {
    let mut accepted = Vec::new();

    for mut link in links {
        let url_lower = link.url.to_lowercase();

        if let Some(rules) = rules {
            if rules
                .exclude
                .iter()
                .any(|pattern| url_lower.contains(&pattern.to_lowercase()))
            {
                continue;
            }

            if !rules.extensions.is_empty() {
                let path = Url::parse(&link.url)
                    .map(|u| u.path().to_lowercase())
                    .unwrap_or_default();
                if !rules
                    .extensions
                    .iter()
                    .any(|ext| path.ends_with(&ext.to_lowercase()))
                {
                    continue;
                }
            }

            if rules
                .include
                .iter()
                .any(|pattern| url_lower.contains(&pattern.to_lowercase()))
            {
                link.is_article = true;
                link.confidence = 0.8;
                accepted.push(link);
                continue;
            }
        }

        if DEFAULT_EXCLUDE_PATTERNS
            .iter()
            .any(|pattern| url_lower.contains(pattern))
        {
            continue;
        }

        let confidence = default_confidence(&link);
        if confidence >= ACCEPT_THRESHOLD {
            link.is_article = true;
            link.confidence = confidence;
            accepted.push(link);
        }
    }

    accepted
}

/// Default article-likelihood score for a link
fn default_confidence(link: &ExtractedLink) -> f64 {
    let url_lower = link.url.to_lowercase();
    let mut confidence: f64 = 0.3;

    if DEFAULT_INCLUDE_PATTERNS
        .iter()
        .any(|pattern| url_lower.contains(pattern))
        || date_path_pattern().is_match(&url_lower)
    {
        confidence += 0.4;
    }

    let segment_count = Url::parse(&link.url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .map(|segments| segments.filter(|s| !s.is_empty()).count())
        })
        .unwrap_or(0);
    if segment_count >= 2 {
        confidence += 0.2;
    }

    if link
        .link_text
        .as_ref()
        .map(|t| t.chars().count() > 30)
        .unwrap_or(false)
    {
        confidence += 0.1;
    }

    confidence.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/news").unwrap()
    }

    fn link(url: &str, text: Option<&str>) -> ExtractedLink {
        ExtractedLink {
            url: url.to_string(),
            link_text: text.map(String::from),
            context: None,
            is_article: false,
            confidence: 0.0,
        }
    }

    #[test]
    fn test_extract_absolute_and_relative() {
        let html = r#"<html><body>
            <a href="https://example.com/news/story-1">One</a>
            <a href="/news/story-2">Two</a>
            <a href="story-3">Three</a>
        </body></html>"#;
        let links = extract_links(html, &base(), None);
        assert_eq!(links.len(), 3);
        assert_eq!(links[1].url, "https://example.com/news/story-2");
        assert_eq!(links[2].url, "https://example.com/story-3");
    }

    #[test]
    fn test_extract_skips_special_schemes() {
        let html = r##"<html><body>
            <a href="javascript:void(0)">js</a>
            <a href="mailto:x@example.com">mail</a>
            <a href="tel:+123">tel</a>
            <a href="data:text/html,hi">data</a>
            <a href="#top">frag</a>
            <a href="ftp://example.com/file">ftp</a>
        </body></html>"##;
        let links = extract_links(html, &base(), None);
        assert!(links.is_empty());
    }

    #[test]
    fn test_extract_restricts_domain() {
        let html = r#"<html><body>
            <a href="https://example.com/news/a">Ours</a>
            <a href="https://other.com/news/b">Theirs</a>
        </body></html>"#;
        let links = extract_links(html, &base(), Some("example.com"));
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/news/a");
    }

    #[test]
    fn test_extract_dedups_by_normalized_url() {
        let html = r#"<html><body>
            <a href="/news/story-1">First</a>
            <a href="/news/story-1/">Trailing slash</a>
            <a href="/news/story-1?utm_source=x">Tracking</a>
        </body></html>"#;
        let links = extract_links(html, &base(), None);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].link_text.as_deref(), Some("First"));
    }

    #[test]
    fn test_extract_captures_text_and_title() {
        let html = r#"<html><body>
            <a href="/news/a" title="Full headline here">  Headline  </a>
        </body></html>"#;
        let links = extract_links(html, &base(), None);
        assert_eq!(links[0].link_text.as_deref(), Some("Headline"));
        assert_eq!(links[0].context.as_deref(), Some("Full headline here"));
    }

    #[test]
    fn test_default_exclude_patterns() {
        let links = vec![
            link("https://example.com/tag/politics", None),
            link("https://example.com/author/jane", None),
            link("https://example.com/styles/site.css", None),
            link("https://example.com/archive?page=2", None),
        ];
        let filtered = filter_article_links(links, None);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_default_include_pattern_accepts() {
        let links = vec![link("https://example.com/news/budget-vote", None)];
        let filtered = filter_article_links(links, None);
        assert_eq!(filtered.len(), 1);
        // base 0.3 + include 0.4 + two segments 0.2
        assert!((filtered[0].confidence - 0.9).abs() < 1e-9);
        assert!(filtered[0].is_article);
    }

    #[test]
    fn test_date_path_counts_as_include() {
        let links = vec![link("https://example.com/2024/05/budget-vote", None)];
        let filtered = filter_article_links(links, None);
        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].confidence >= 0.7);
    }

    #[test]
    fn test_shallow_unmatched_link_rejected() {
        // base 0.3 only: no include pattern, one segment, short text
        let links = vec![link("https://example.com/widgets", Some("short"))];
        let filtered = filter_article_links(links, None);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_long_anchor_text_bonus() {
        // base 0.3 + long anchor 0.1 = 0.4, right at the threshold
        let links = vec![link(
            "https://example.com/something",
            Some("This anchor text is well over thirty characters"),
        )];
        let filtered = filter_article_links(links, None);
        assert_eq!(filtered.len(), 1);
        assert!((filtered[0].confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_custom_include_fixes_confidence() {
        let rules = LinkRules {
            include: vec!["/wiadomosci/".to_string()],
            ..Default::default()
        };
        let links = vec![link("https://example.pl/wiadomosci/x", None)];
        let filtered = filter_article_links(links, Some(&rules));
        assert_eq!(filtered.len(), 1);
        assert!((filtered[0].confidence - 0.8).abs() < 1e-9);
        assert!(filtered[0].is_article);
    }

    #[test]
    fn test_custom_exclude_wins_over_include_patterns() {
        let rules = LinkRules {
            exclude: vec!["/video/".to_string()],
            ..Default::default()
        };
        let links = vec![link("https://example.com/news/video/clip-1", None)];
        let filtered = filter_article_links(links, Some(&rules));
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_required_extension() {
        let rules = LinkRules {
            extensions: vec![".html".to_string()],
            ..Default::default()
        };
        let links = vec![
            link("https://example.com/news/story-1.html", None),
            link("https://example.com/news/story-2", None),
        ];
        let filtered = filter_article_links(links, Some(&rules));
        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].url.ends_with(".html"));
    }

    #[test]
    fn test_unmatched_custom_include_falls_through_to_default() {
        let rules = LinkRules {
            include: vec!["/special/".to_string()],
            ..Default::default()
        };
        // Does not match the custom include, but matches the default
        // include pattern and has enough path depth
        let links = vec![link("https://example.com/news/story-1", None)];
        let filtered = filter_article_links(links, Some(&rules));
        assert_eq!(filtered.len(), 1);
        assert!((filtered[0].confidence - 0.9).abs() < 1e-9);
    }
}

//! DOM-driven content extraction
//!
//! Relies on semantic markup: article containers, heading tags, and meta
//! tags for metadata. Fast and precise on well-structured pages, useless
//! on markup soup.

use super::{ContentExtractor, ExtractionResult};
use crate::Metadata;
use scraper::{ElementRef, Html, Selector};

/// Container selectors tried in order for the article body
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    "main article",
    "[itemprop=\"articleBody\"]",
    "div.article-body",
    "div.article-content",
    "div.post-content",
    "div.entry-content",
    "div.story-body",
    "main",
];

/// Selectors stripped from a container before text collection
const NOISE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "nav",
    "header",
    "footer",
    "aside",
    "form",
    "figure",
    ".share",
    ".related",
    ".comments",
    ".advertisement",
];

/// Meta tags mapped into metadata fields, in (selector, field) pairs;
/// the first match per field wins
const META_FIELDS: &[(&str, &str)] = &[
    ("meta[property=\"og:title\"]", "og_title"),
    ("meta[property=\"og:description\"]", "description"),
    ("meta[name=\"description\"]", "description"),
    ("meta[name=\"author\"]", "author"),
    ("meta[property=\"article:author\"]", "author"),
    ("meta[property=\"article:published_time\"]", "published_at"),
    ("meta[property=\"article:modified_time\"]", "modified_at"),
    ("meta[property=\"og:site_name\"]", "site_name"),
    ("meta[property=\"og:image\"]", "image"),
    ("meta[property=\"article:section\"]", "section"),
];

#[derive(Debug, Default)]
pub struct DomExtractor;

impl DomExtractor {
    pub fn new() -> Self {
        DomExtractor
    }

    fn find_title(document: &Html) -> Option<String> {
        for selector_str in &["article h1", "h1", "meta[property=\"og:title\"]", "title"] {
            let selector = match Selector::parse(selector_str) {
                Ok(s) => s,
                Err(_) => continue,
            };
            if let Some(element) = document.select(&selector).next() {
                let text = if selector_str.starts_with("meta") {
                    element.value().attr("content").unwrap_or("").to_string()
                } else {
                    element.text().collect::<String>()
                };
                let text = text.trim();
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
        }
        None
    }

    /// Document language from the `<html lang>` attribute, falling back to
    /// the og:locale meta tag
    fn find_language(document: &Html) -> Option<String> {
        if let Ok(selector) = Selector::parse("html") {
            if let Some(root) = document.select(&selector).next() {
                if let Some(lang) = root.value().attr("lang") {
                    let lang = lang.trim();
                    if !lang.is_empty() {
                        return Some(lang.to_string());
                    }
                }
            }
        }

        let selector = Selector::parse("meta[property=\"og:locale\"]").ok()?;
        let element = document.select(&selector).next()?;
        let locale = element.value().attr("content")?.trim();
        if locale.is_empty() {
            None
        } else {
            Some(locale.replace('_', "-"))
        }
    }

    fn collect_metadata(document: &Html) -> Metadata {
        let mut metadata = Metadata::new();
        if let Some(language) = Self::find_language(document) {
            metadata.insert("language".to_string(), serde_json::json!(language));
        }
        for (selector_str, field) in META_FIELDS {
            if metadata.contains_key(*field) {
                continue;
            }
            let selector = match Selector::parse(selector_str) {
                Ok(s) => s,
                Err(_) => continue,
            };
            if let Some(element) = document.select(&selector).next() {
                if let Some(content) = element.value().attr("content") {
                    let content = content.trim();
                    if !content.is_empty() {
                        metadata.insert(field.to_string(), serde_json::json!(content));
                    }
                }
            }
        }
        metadata
    }

    /// Collects paragraph text from a container, skipping noise elements
    fn collect_text(container: ElementRef<'_>) -> String {
        let noise: Vec<Selector> = NOISE_SELECTORS
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .collect();

        let paragraph_selector = match Selector::parse("p, h2, h3, li, blockquote") {
            Ok(s) => s,
            Err(_) => return String::new(),
        };

        let mut paragraphs = Vec::new();
        'blocks: for block in container.select(&paragraph_selector) {
            for noise_selector in &noise {
                for noisy in container.select(noise_selector) {
                    if is_ancestor_of(noisy, block) {
                        continue 'blocks;
                    }
                }
            }

            let text = block
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                paragraphs.push(text);
            }
        }

        paragraphs.join("\n\n")
    }
}

fn is_ancestor_of(ancestor: ElementRef<'_>, node: ElementRef<'_>) -> bool {
    node.ancestors().any(|a| a.id() == ancestor.id())
}

impl ContentExtractor for DomExtractor {
    fn name(&self) -> &'static str {
        "dom"
    }

    fn extract(&self, html: &str, _url: &str) -> ExtractionResult {
        let document = Html::parse_document(html);
        let title = Self::find_title(&document);
        let metadata = Self::collect_metadata(&document);

        for selector_str in CONTENT_SELECTORS {
            let selector = match Selector::parse(selector_str) {
                Ok(s) => s,
                Err(_) => continue,
            };
            if let Some(container) = document.select(&selector).next() {
                let text = Self::collect_text(container);
                if !text.is_empty() {
                    return ExtractionResult::from_text(title, text, html, metadata, self.name());
                }
            }
        }

        let mut failed = ExtractionResult::failed(self.name());
        failed.title = title;
        failed.metadata = metadata;
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::super::ExtractionQuality;
    use super::*;

    fn article_page(body: &str) -> String {
        format!(
            r#"<html><head>
                <title>Site | Budget vote passes</title>
                <meta property="og:title" content="Budget vote passes">
                <meta name="author" content="Jane Doe">
                <meta property="article:published_time" content="2026-08-01T10:00:00Z">
            </head><body>
                <nav><a href="/">Home</a></nav>
                <article><h1>Budget vote passes</h1>{body}</article>
                <footer>All rights reserved</footer>
            </body></html>"#
        )
    }

    #[test]
    fn test_extracts_article_body() {
        let body = "<p>First paragraph of the story.</p><p>Second paragraph here.</p>";
        let result = DomExtractor::new().extract(&article_page(body), "https://example.com/a");
        assert_eq!(result.title.as_deref(), Some("Budget vote passes"));
        assert!(result.text.contains("First paragraph of the story."));
        assert!(result.text.contains("\n\n"));
        assert!(!result.text.contains("Home"));
    }

    #[test]
    fn test_collects_meta_fields() {
        let result =
            DomExtractor::new().extract(&article_page("<p>Body.</p>"), "https://example.com/a");
        assert_eq!(result.metadata["author"], "Jane Doe");
        assert_eq!(result.metadata["published_at"], "2026-08-01T10:00:00Z");
        assert_eq!(result.metadata["og_title"], "Budget vote passes");
    }

    #[test]
    fn test_first_meta_match_wins() {
        let html = r#"<html><head>
            <meta property="og:description" content="from og">
            <meta name="description" content="from name">
        </head><body><article><p>Body.</p></article></body></html>"#;
        let result = DomExtractor::new().extract(html, "https://example.com/a");
        assert_eq!(result.metadata["description"], "from og");
    }

    #[test]
    fn test_skips_noise_inside_container() {
        let html = r#"<html><body><article>
            <p>Real content.</p>
            <aside><p>Sidebar junk.</p></aside>
            <script>var x = 1;</script>
        </article></body></html>"#;
        let result = DomExtractor::new().extract(html, "https://example.com/a");
        assert!(result.text.contains("Real content."));
        assert!(!result.text.contains("Sidebar junk."));
        assert!(!result.text.contains("var x"));
    }

    #[test]
    fn test_no_container_fails() {
        let html = "<html><body><div><span>loose text</span></div></body></html>";
        let result = DomExtractor::new().extract(html, "https://example.com/a");
        assert_eq!(result.quality, ExtractionQuality::Failed);
        assert!(result.text.is_empty());
    }

    #[test]
    fn test_collects_document_language() {
        let html = r#"<html lang="pl"><body><article><p>Treść.</p></article></body></html>"#;
        let result = DomExtractor::new().extract(html, "https://example.com/a");
        assert_eq!(result.metadata["language"], "pl");
    }

    #[test]
    fn test_language_falls_back_to_og_locale() {
        let html = r#"<html><head>
            <meta property="og:locale" content="en_US">
        </head><body><article><p>Body.</p></article></body></html>"#;
        let result = DomExtractor::new().extract(html, "https://example.com/a");
        assert_eq!(result.metadata["language"], "en-US");
    }

    #[test]
    fn test_language_raises_confidence() {
        let body = format!("<p>{}</p>", "word ".repeat(600));
        let with_lang = format!(
            r#"<html lang="en"><body><article>{}</article></body></html>"#,
            body
        );
        let without = format!("<html><body><article>{}</article></body></html>", body);

        let extractor = DomExtractor::new();
        let a = extractor.extract(&with_lang, "https://example.com/a");
        let b = extractor.extract(&without, "https://example.com/a");

        assert_eq!(a.quality, b.quality);
        assert!((a.confidence - b.confidence - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_title_falls_back_to_title_tag() {
        let html = "<html><head><title>Plain Title</title></head><body><article><p>Body.</p></article></body></html>";
        let result = DomExtractor::new().extract(html, "https://example.com/a");
        assert_eq!(result.title.as_deref(), Some("Plain Title"));
    }
}

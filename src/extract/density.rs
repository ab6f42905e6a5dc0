//! Text-density content extraction
//!
//! Markup-agnostic fallback: scores every block element by how much prose
//! it holds relative to its link text, then keeps the densest cluster.
//! Slower and fuzzier than DOM extraction, but works on pages with no
//! semantic structure.

use super::{ContentExtractor, ExtractionResult};
use crate::Metadata;
use scraper::{ElementRef, Html, Selector};

/// Minimum characters for a block to count as a prose candidate
const MIN_BLOCK_CHARS: usize = 80;

/// Blocks whose text is mostly link text are navigation, not prose
const MAX_LINK_DENSITY: f64 = 0.4;

#[derive(Debug, Default)]
pub struct TextDensityExtractor;

impl TextDensityExtractor {
    pub fn new() -> Self {
        TextDensityExtractor
    }

    fn block_text(block: ElementRef<'_>) -> String {
        block
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Fraction of a block's characters that sit inside anchor tags
    fn link_density(block: ElementRef<'_>) -> f64 {
        let total: usize = Self::block_text(block).chars().count();
        if total == 0 {
            return 1.0;
        }
        let anchor_selector = match Selector::parse("a") {
            Ok(s) => s,
            Err(_) => return 1.0,
        };
        let linked: usize = block
            .select(&anchor_selector)
            .map(|a| Self::block_text(a).chars().count())
            .sum();
        linked as f64 / total as f64
    }
}

impl ContentExtractor for TextDensityExtractor {
    fn name(&self) -> &'static str {
        "density"
    }

    fn extract(&self, html: &str, _url: &str) -> ExtractionResult {
        let document = Html::parse_document(html);

        let block_selector = match Selector::parse("p, div, td, blockquote, pre") {
            Ok(s) => s,
            Err(_) => return ExtractionResult::failed(self.name()),
        };

        // Keep leaf-ish prose blocks: long enough, mostly non-link text,
        // and not merely wrapping other candidate blocks
        let mut paragraphs: Vec<String> = Vec::new();
        for block in document.select(&block_selector) {
            let has_block_children = block
                .select(&block_selector)
                .any(|child| child.id() != block.id());
            if has_block_children {
                continue;
            }

            let text = Self::block_text(block);
            if text.chars().count() < MIN_BLOCK_CHARS {
                continue;
            }
            if Self::link_density(block) > MAX_LINK_DENSITY {
                continue;
            }
            paragraphs.push(text);
        }

        if paragraphs.is_empty() {
            return ExtractionResult::failed(self.name());
        }

        let title_selector = Selector::parse("h1, title").ok();
        let title = title_selector.and_then(|s| {
            document
                .select(&s)
                .next()
                .map(|e| e.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
        });

        ExtractionResult::from_text(
            title,
            paragraphs.join("\n\n"),
            html,
            Metadata::new(),
            self.name(),
        )
    }
}

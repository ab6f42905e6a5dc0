//! Article content extraction
//!
//! Two extractors with different failure modes: a DOM extractor driven by
//! semantic markup, and a text-density extractor that needs no markup at
//! all. The hybrid extractor runs them in sequence and keeps the better
//! result.

mod density;
mod dom;
mod hybrid;
mod quality;

pub use density::TextDensityExtractor;
pub use dom::DomExtractor;
pub use hybrid::HybridExtractor;
pub use quality::{
    assess_quality, contains_boilerplate, contains_paywall_markers, count_words, score_confidence,
    ExtractionQuality,
};

use crate::Metadata;

/// Result of extracting article content from a page
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// Article title, when one was found
    pub title: Option<String>,

    /// Extracted body text, paragraphs joined by blank lines
    pub text: String,

    /// Article metadata (author, published date, description, ...)
    pub metadata: Metadata,

    pub word_count: usize,

    pub quality: ExtractionQuality,

    /// Confidence in this extraction, in [0, 1]
    pub confidence: f64,

    /// Name of the extractor that produced the text
    pub extractor: String,

    /// How the hybrid pipeline arrived at this result
    pub method: String,
}

impl ExtractionResult {
    /// Builds a result, deriving word count, quality, and confidence from
    /// the text and metadata. `source_html` is only consulted for paywall
    /// markers.
    pub fn from_text(
        title: Option<String>,
        text: String,
        source_html: &str,
        metadata: Metadata,
        extractor: &str,
    ) -> Self {
        let word_count = count_words(&text);
        let quality = assess_quality(word_count);
        let key_fields = key_metadata_fields(title.as_deref(), &metadata);
        let confidence = score_confidence(quality, &text, source_html, word_count, key_fields);
        ExtractionResult {
            title,
            text,
            metadata,
            word_count,
            quality,
            confidence,
            extractor: extractor.to_string(),
            method: extractor.to_string(),
        }
    }

    /// An empty failed result attributed to `extractor`
    pub fn failed(extractor: &str) -> Self {
        ExtractionResult {
            title: None,
            text: String::new(),
            metadata: Metadata::new(),
            word_count: 0,
            quality: ExtractionQuality::Failed,
            confidence: 0.0,
            extractor: extractor.to_string(),
            method: extractor.to_string(),
        }
    }
}

/// Counts the metadata fields that feed the confidence bonus: title,
/// author, publish date, and language
fn key_metadata_fields(title: Option<&str>, metadata: &Metadata) -> usize {
    let mut count = usize::from(title.map(|t| !t.is_empty()).unwrap_or(false));
    for field in ["author", "published_at", "language"] {
        if metadata
            .get(field)
            .and_then(|v| v.as_str())
            .map(|v| !v.is_empty())
            .unwrap_or(false)
        {
            count += 1;
        }
    }
    count
}

/// A content extraction strategy
pub trait ContentExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_available(&self) -> bool {
        true
    }

    /// Extracts article content from `html`
    ///
    /// Failure to find content is not an error: it yields a result with
    /// quality `Failed`. Errors are reserved for malformed inputs.
    fn extract(&self, html: &str, url: &str) -> ExtractionResult;
}

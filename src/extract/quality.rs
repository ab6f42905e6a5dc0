//! Extraction quality assessment and confidence scoring

use serde::{Deserialize, Serialize};

/// Quality tier of an extraction, ordered worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionQuality {
    Failed,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl ExtractionQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionQuality::Failed => "failed",
            ExtractionQuality::Poor => "poor",
            ExtractionQuality::Fair => "fair",
            ExtractionQuality::Good => "good",
            ExtractionQuality::Excellent => "excellent",
        }
    }

    /// Base confidence contributed by this tier
    pub fn base_confidence(&self) -> f64 {
        match self {
            ExtractionQuality::Excellent => 0.9,
            ExtractionQuality::Good => 0.75,
            ExtractionQuality::Fair => 0.5,
            ExtractionQuality::Poor => 0.3,
            ExtractionQuality::Failed => 0.0,
        }
    }
}

impl std::fmt::Display for ExtractionQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Phrases that indicate the page body is a paywall or signup prompt
/// rather than article content
const PAYWALL_PHRASES: &[&str] = &[
    "subscribe to continue",
    "subscribe to read",
    "subscription required",
    "sign in to continue",
    "log in to continue",
    "register to continue",
    "this content is for subscribers",
    "already a subscriber",
    "to read the full article",
];

/// Subscribe/newsletter phrasing that marks boilerplate leaking into the
/// extracted body
const BOILERPLATE_PHRASES: &[&str] = &[
    "subscribe to our newsletter",
    "sign up for our newsletter",
    "join our mailing list",
    "get our free newsletter",
    "delivered to your inbox",
];

/// Assigns a quality tier from extracted word count
pub fn assess_quality(word_count: usize) -> ExtractionQuality {
    match word_count {
        0 => ExtractionQuality::Failed,
        1..=199 => ExtractionQuality::Poor,
        200..=499 => ExtractionQuality::Fair,
        500..=999 => ExtractionQuality::Good,
        _ => ExtractionQuality::Excellent,
    }
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn contains_paywall_markers(text: &str) -> bool {
    let lower = text.to_lowercase();
    PAYWALL_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

pub fn contains_boilerplate(text: &str) -> bool {
    let lower = text.to_lowercase();
    BOILERPLATE_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Scores confidence in an extraction
///
/// Starts from the tier's base confidence and adds 0.02 per key metadata
/// field present (title, author, publish date, language). Subtracts 0.05
/// when newsletter boilerplate leaked into the extracted body, and 0.1
/// when the source HTML carries paywall markers while the extracted body
/// is suspiciously short (<300 words). Clamped to [0, 1].
pub fn score_confidence(
    quality: ExtractionQuality,
    text: &str,
    source_html: &str,
    word_count: usize,
    metadata_fields: usize,
) -> f64 {
    let mut confidence = quality.base_confidence();
    confidence += 0.02 * metadata_fields as f64;

    if contains_boilerplate(text) {
        confidence -= 0.05;
    }
    if word_count < 300 && contains_paywall_markers(source_html) {
        confidence -= 0.1;
    }

    confidence.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_tiers() {
        assert_eq!(assess_quality(0), ExtractionQuality::Failed);
        assert_eq!(assess_quality(1), ExtractionQuality::Poor);
        assert_eq!(assess_quality(199), ExtractionQuality::Poor);
        assert_eq!(assess_quality(200), ExtractionQuality::Fair);
        assert_eq!(assess_quality(499), ExtractionQuality::Fair);
        assert_eq!(assess_quality(500), ExtractionQuality::Good);
        assert_eq!(assess_quality(999), ExtractionQuality::Good);
        assert_eq!(assess_quality(1000), ExtractionQuality::Excellent);
    }

    #[test]
    fn test_quality_ordering() {
        assert!(ExtractionQuality::Excellent > ExtractionQuality::Good);
        assert!(ExtractionQuality::Good > ExtractionQuality::Fair);
        assert!(ExtractionQuality::Fair > ExtractionQuality::Poor);
        assert!(ExtractionQuality::Poor > ExtractionQuality::Failed);
    }

    #[test]
    fn test_quality_serde_lowercase() {
        let json = serde_json::to_string(&ExtractionQuality::Good).unwrap();
        assert_eq!(json, "\"good\"");
        let parsed: ExtractionQuality = serde_json::from_str("\"excellent\"").unwrap();
        assert_eq!(parsed, ExtractionQuality::Excellent);
    }

    #[test]
    fn test_base_confidence_per_tier() {
        assert_eq!(ExtractionQuality::Excellent.base_confidence(), 0.9);
        assert_eq!(ExtractionQuality::Good.base_confidence(), 0.75);
        assert_eq!(ExtractionQuality::Fair.base_confidence(), 0.5);
        assert_eq!(ExtractionQuality::Poor.base_confidence(), 0.3);
        assert_eq!(ExtractionQuality::Failed.base_confidence(), 0.0);
    }

    #[test]
    fn test_metadata_bonus() {
        let score = score_confidence(ExtractionQuality::Good, "clean text", "", 600, 3);
        assert!((score - 0.81).abs() < 1e-9);
    }

    #[test]
    fn test_boilerplate_penalty() {
        let clean = "The committee approved the measure after debate.";
        assert!(!contains_boilerplate(clean));
        let leaked = "Final paragraph. Subscribe to our newsletter for more.";
        assert!(contains_boilerplate(leaked));
        let score = score_confidence(ExtractionQuality::Good, leaked, "", 600, 0);
        assert!((score - 0.70).abs() < 1e-9);
    }

    #[test]
    fn test_paywall_penalty_only_on_short_body() {
        let html = "<div class=\"gate\">Subscribe to continue reading.</div>";
        let short = score_confidence(ExtractionQuality::Poor, "teaser text", html, 50, 0);
        assert!((short - 0.2).abs() < 1e-9);
        // Same markers alongside a full-length body do not penalize
        let long = score_confidence(ExtractionQuality::Good, "full body", html, 600, 0);
        assert!((long - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_clamped() {
        let score = score_confidence(ExtractionQuality::Excellent, "text", "", 2000, 20);
        assert!(score <= 1.0);
        let floor = score_confidence(ExtractionQuality::Failed, "", "", 0, 0);
        assert_eq!(floor, 0.0);
    }

    #[test]
    fn test_excellent_with_key_metadata_meets_floor() {
        let text = "word ".repeat(1000);
        let quality = assess_quality(count_words(&text));
        assert_eq!(quality, ExtractionQuality::Excellent);
        let score = score_confidence(quality, &text, "", 1000, 3);
        assert!(score >= 0.9);
    }
}

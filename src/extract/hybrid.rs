//! Hybrid extraction pipeline

use super::{ContentExtractor, ExtractionQuality, ExtractionResult};
use tracing::debug;

/// Runs a primary extractor and, when its result falls below the quality
/// floor, a fallback; keeps whichever result scores higher.
///
/// The winning result's `method` records the path taken: `primary_only`
/// when the fallback never ran, `primary_preferred` or
/// `fallback_preferred` when both ran. Metadata the loser found and the
/// winner missed is merged into the winner.
pub struct HybridExtractor {
    primary: Box<dyn ContentExtractor>,
    fallback: Box<dyn ContentExtractor>,
    min_quality: ExtractionQuality,
}

impl HybridExtractor {
    pub fn new(min_quality: ExtractionQuality) -> Self {
        HybridExtractor {
            primary: Box::new(super::DomExtractor::new()),
            fallback: Box::new(super::TextDensityExtractor::new()),
            min_quality,
        }
    }

    pub fn with_extractors(
        primary: Box<dyn ContentExtractor>,
        fallback: Box<dyn ContentExtractor>,
        min_quality: ExtractionQuality,
    ) -> Self {
        HybridExtractor {
            primary,
            fallback,
            min_quality,
        }
    }

    /// Copies fields the winner is missing from the loser's metadata
    fn merge_metadata(winner: &mut ExtractionResult, loser: &ExtractionResult) {
        for (key, value) in &loser.metadata {
            if !winner.metadata.contains_key(key) {
                winner.metadata.insert(key.clone(), value.clone());
            }
        }
        if winner.title.is_none() {
            winner.title = loser.title.clone();
        }
    }
}

impl ContentExtractor for HybridExtractor {
    fn name(&self) -> &'static str {
        "hybrid"
    }

    fn extract(&self, html: &str, url: &str) -> ExtractionResult {
        let mut primary = self.primary.extract(html, url);

        if primary.quality >= self.min_quality {
            primary.method = "primary_only".to_string();
            return primary;
        }

        debug!(
            url,
            quality = %primary.quality,
            "primary extraction below quality floor, trying fallback"
        );

        if !self.fallback.is_available() {
            primary.method = "primary_only".to_string();
            return primary;
        }

        let fallback = self.fallback.extract(html, url);

        if fallback.confidence > primary.confidence {
            let mut winner = fallback;
            Self::merge_metadata(&mut winner, &primary);
            winner.method = "fallback_preferred".to_string();
            winner
        } else {
            Self::merge_metadata(&mut primary, &fallback);
            primary.method = "primary_preferred".to_string();
            primary
        }
    }
}

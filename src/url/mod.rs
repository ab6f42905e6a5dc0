//! URL handling for the ingestion engine
//!
//! Provides URL normalization (the canonical form used for deduplication),
//! domain extraction, and the per-session seen-URL set.

mod domain;
mod normalize;
mod seen;

pub use domain::extract_domain;
pub use normalize::normalize_url;
pub use seen::SeenUrls;

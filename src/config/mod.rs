//! Configuration for the ingestion engine
//!
//! Loads, parses, and validates TOML configuration files. All crawler
//! tunables are strongly typed and validated once at load time rather than
//! read ad hoc from loosely-shaped maps.
//!
//! # Example
//!
//! ```no_run
//! use kumo_ingest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sources.toml")).unwrap();
//! println!("{} sources configured", config.sources.len());
//! ```

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{
    Config, FetchConfig, LinkRulesConfig, PaginationConfig, PaginationKind, SourceConfig,
    WorkflowConfig,
};
pub use validation::validate;

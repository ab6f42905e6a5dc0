use crate::config::types::{Config, FetchConfig, PaginationKind, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    for source in &config.sources {
        validate_source(source)?;
    }
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.max_concurrency < 1 || config.max_concurrency > 50 {
        return Err(ConfigError::Validation(format!(
            "max-concurrency must be between 1 and 50, got {}",
            config.max_concurrency
        )));
    }

    if config.browser_max_concurrency < 1 || config.browser_max_concurrency > 10 {
        return Err(ConfigError::Validation(format!(
            "browser-max-concurrency must be between 1 and 10, got {}",
            config.browser_max_concurrency
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates a single source entry
fn validate_source(source: &SourceConfig) -> Result<(), ConfigError> {
    if source.name.is_empty() {
        return Err(ConfigError::Validation(
            "source name cannot be empty".to_string(),
        ));
    }

    let url = Url::parse(&source.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", source.base_url, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{}: only http(s) sources are supported",
            source.base_url
        )));
    }

    if source.pagination.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "source {}: max-pages must be >= 1",
            source.name
        )));
    }

    if source.pagination.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "source {}: start-page must be >= 1",
            source.name
        )));
    }

    // The path strategy is unusable without a template to substitute into
    if source.pagination.strategy == Some(PaginationKind::Path)
        && source.pagination.path_template.is_none()
    {
        return Err(ConfigError::Validation(format!(
            "source {}: path pagination requires path-template",
            source.name
        )));
    }

    if let Some(template) = &source.pagination.path_template {
        if !template.contains("{page}") {
            return Err(ConfigError::Validation(format!(
                "source {}: path-template must contain {{page}}",
                source.name
            )));
        }
    }

    if source.max_articles == Some(0) {
        return Err(ConfigError::Validation(format!(
            "source {}: max-articles must be >= 1 when set",
            source.name
        )));
    }

    Ok(())
}

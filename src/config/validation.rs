use crate::config::types::{Config, CrawlerConfig, IdentityConfig, OutputConfig, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on in-flight fetches
const MAX_CONCURRENT_FETCHES: u32 = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_source_config(&config.source)?;
    validate_identity_config(&config.identity)?;
    validate_output_config(&config.output)?;

    if config.proxies.file.trim().is_empty() {
        return Err(ConfigError::Validation(
            "proxies.file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > MAX_CONCURRENT_FETCHES
    {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and {}, got {}",
            MAX_CONCURRENT_FETCHES, config.max_concurrent_fetches
        )));
    }

    if config.bootstrap_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "bootstrap_attempts must be >= 1, got {}",
            config.bootstrap_attempts
        )));
    }

    if config.rotation_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "rotation_attempts must be >= 1, got {}",
            config.rotation_attempts
        )));
    }

    if config.max_detail_attempts == Some(0) {
        return Err(ConfigError::Validation(
            "max_detail_attempts must be >= 1 when set".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the remote source locations
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.airports_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "airports_path cannot be empty".to_string(),
        ));
    }

    if !config.destinations_path.contains("{code}") {
        return Err(ConfigError::Validation(format!(
            "destinations_path must contain the {{code}} placeholder, got '{}'",
            config.destinations_path
        )));
    }

    Ok(())
}

fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.airports_path.is_empty() {
        return Err(ConfigError::Validation(
            "airports_path cannot be empty".to_string(),
        ));
    }

    if config.carriers_path.is_empty() {
        return Err(ConfigError::Validation(
            "carriers_path cannot be empty".to_string(),
        ));
    }

    if config.airports_path == config.carriers_path {
        return Err(ConfigError::Validation(format!(
            "airports_path and carriers_path must differ, both are '{}'",
            config.airports_path
        )));
    }

    Ok(())
}

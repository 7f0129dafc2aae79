use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Scraper program is set and at least one site is configured
/// - Site ids are non-empty and unique
/// - Scraper timeout, when set, is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.scraper.program.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "scraper.program cannot be empty".to_string(),
        ));
    }

    if config.scraper.sites.is_empty() {
        return Err(ConfigError::ValidationError(
            "scraper.sites must list at least one site".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for site in &config.scraper.sites {
        if site.id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "scraper.sites entries need a non-empty id".to_string(),
            ));
        }
        if !seen.insert(site.id.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "scraper.sites contains duplicate id '{}'",
                site.id
            )));
        }
    }

    if config.scraper.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "scraper.timeout_secs cannot be 0 (omit it for no timeout)".to_string(),
        ));
    }

    Ok(())
}

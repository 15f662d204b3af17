//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate upstream base URLs and credential header names
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic validation failure.
#[derive(Debug, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

fn check_base_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError {
            field,
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError {
            field,
            reason: format!("not a valid URL: {e}"),
        }),
    }
}

/// Validate a loaded configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_base_url(&mut errors, "admin_daemon.base_url", &config.admin_daemon.base_url);

    if config.admin_daemon.token.is_empty() {
        errors.push(ValidationError {
            field: "admin_daemon.token",
            reason: "must not be empty".to_string(),
        });
    }

    if config
        .admin_daemon
        .token_header
        .parse::<axum::http::HeaderName>()
        .is_err()
    {
        errors.push(ValidationError {
            field: "admin_daemon.token_header",
            reason: "not a valid header name".to_string(),
        });
    }

    if let Some(movie) = &config.indexers.movie {
        check_base_url(&mut errors, "indexers.movie.base_url", &movie.base_url);
    }
    if let Some(series) = &config.indexers.series {
        check_base_url(&mut errors, "indexers.series.base_url", &series.base_url);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.request_secs",
            reason: "must be greater than zero".to_string(),
        });
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError {
            field: "timeouts.upstream_secs",
            reason: "must be greater than zero".to_string(),
        });
    }

    if config.storage.data_dir.is_empty() {
        errors.push(ValidationError {
            field: "storage.data_dir",
            reason: "must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::IndexerConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_bad_urls_are_collected() {
        let mut config = GatewayConfig::default();
        config.admin_daemon.base_url = "not a url".to_string();
        config.indexers.movie = Some(IndexerConfig {
            base_url: "ftp://indexer.example".to_string(),
            api_key: "k".to_string(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.field == "admin_daemon.base_url"));
        assert!(errors.iter().any(|e| e.field == "indexers.movie.base_url"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = GatewayConfig::default();
        config.timeouts.upstream_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "timeouts.upstream_secs"));
    }
}

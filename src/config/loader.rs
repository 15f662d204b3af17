//! Configuration loading from disk and the environment.
//!
//! Precedence, lowest to highest: built-in defaults → TOML file →
//! environment variables. `SERVICE_URL_<NAME>` bindings are NOT read
//! here; the named-service proxy resolves them per request.

use std::path::Path;

use crate::config::schema::{GatewayConfig, IndexerConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: TOML file (if given), then environment overrides,
/// then semantic validation.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay deployment inputs from the environment onto the config.
fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Ok(addr) = std::env::var("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Ok(dir) = std::env::var("DATA_DIR") {
        config.storage.data_dir = dir;
    }
    if let Ok(url) = std::env::var("ADMIN_DAEMON_URL") {
        config.admin_daemon.base_url = url;
    }
    if let Ok(token) = std::env::var("ADMIN_DAEMON_TOKEN") {
        config.admin_daemon.token = token;
    }

    if let Some(indexer) = indexer_from_env("MOVIE_INDEXER_URL", "MOVIE_INDEXER_KEY") {
        config.indexers.movie = Some(indexer);
    }
    if let Some(indexer) = indexer_from_env("SERIES_INDEXER_URL", "SERIES_INDEXER_KEY") {
        config.indexers.series = Some(indexer);
    }
}

/// An indexer binding needs both its URL and key to be usable.
fn indexer_from_env(url_var: &str, key_var: &str) -> Option<IndexerConfig> {
    let base_url = std::env::var(url_var).ok()?;
    let api_key = std::env::var(key_var).ok()?;
    Some(IndexerConfig { base_url, api_key })
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from
//! config files; deployment-specific values can additionally be
//! overridden from the environment (see `loader`).

use serde::{Deserialize, Serialize};

/// Root configuration for the portal gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, connection limits).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Admin daemon upstream (path-prefix proxy target).
    pub admin_daemon: AdminDaemonConfig,

    /// Third-party media indexer upstreams.
    pub indexers: IndexerTable,

    /// Flat-file store locations.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Security hardening settings.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Timeout for a single upstream call in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            upstream_secs: 30,
        }
    }
}

/// Admin daemon proxy target.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminDaemonConfig {
    /// Base URL of the admin daemon (e.g., "http://127.0.0.1:5055").
    pub base_url: String,

    /// Service credential injected on every forwarded request.
    pub token: String,

    /// Header name the credential is injected under.
    pub token_header: String,
}

impl Default for AdminDaemonConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5055".to_string(),
            // WARNING: This is a placeholder! Change this in production.
            token: "CHANGE_ME_IN_PRODUCTION".to_string(),
            token_header: "X-Api-Key".to_string(),
        }
    }
}

/// The two media indexer upstreams, each individually optional.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IndexerTable {
    /// Movie title lookup API.
    pub movie: Option<IndexerConfig>,

    /// Series title lookup API.
    pub series: Option<IndexerConfig>,
}

/// A single third-party indexer endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexerConfig {
    /// Search endpoint base URL.
    pub base_url: String,

    /// API key, sent as the X-Api-Key header.
    pub api_key: String,
}

/// Flat-file store locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding all persisted JSON files.
    pub data_dir: String,
}

impl StorageConfig {
    pub fn rate_limit_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("rate-limits.json")
    }

    pub fn user_sessions_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("sessions.json")
    }

    pub fn admin_sessions_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("admin-sessions.json")
    }

    pub fn invites_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("invites.json")
    }

    pub fn issues_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("content-issues.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

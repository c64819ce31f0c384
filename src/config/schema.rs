//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Raw HTTP(S) listener.
    pub listener: ListenerConfig,

    /// JSON-RPC listener.
    pub rpc: RpcConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Static assets served by system routes.
    pub assets: AssetConfig,

    /// Backing services handlers forward to.
    pub services: ServicesConfig,

    /// In-memory session store settings.
    pub sessions: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// JSON-RPC binding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Serve the JSON-RPC binding.
    pub enabled: bool,

    /// Bind address of the JSON-RPC listener.
    pub bind_address: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Timeout for calls to backing services in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

/// Asset manifest. Every entry becomes a route at startup.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AssetConfig {
    /// Served at `favicon.ico`.
    pub favicon: Option<PathBuf>,

    /// Served at `main`.
    pub main_page: Option<PathBuf>,

    /// Served at `sys/login`.
    pub login_page: Option<PathBuf>,

    /// Served at `sys/register`.
    pub register_page: Option<PathBuf>,

    /// Served at `sys/fonts/{name}`.
    pub fonts: BTreeMap<String, PathBuf>,

    /// Served at `sys/images/{name}`.
    pub images: BTreeMap<String, PathBuf>,
}

/// Backing services.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServicesConfig {
    /// JSON-RPC endpoint of the page-request service.
    pub pagereq: Option<UpstreamConfig>,
}

/// A JSON-RPC service endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Endpoint URL (e.g., "http://127.0.0.1:3001/").
    pub url: String,
}

/// Session store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Session lifetime in seconds.
    pub ttl_secs: u64,

    /// Interval between expired-session sweeps in seconds.
    pub purge_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60 * 60 * 24,
            purge_interval_secs: 300,
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
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration for the forwarding gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Shared-secret authentication.
    pub auth: AuthConfig,

    /// Optional upstream egress proxy.
    pub upstream: UpstreamConfig,

    /// Request/response dumping.
    pub dump: DumpConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret expected in `X-Proxy-Auth`. Absent or empty disables auth.
    pub secret: Option<String>,
}

/// Upstream egress proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Forward proxy every destination connection goes through
    /// (e.g., "http://127.0.0.1:7890").
    pub proxy_url: Option<String>,

    /// Destination connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
}

/// Dump configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Dump requests and responses to the log.
    pub enabled: bool,

    /// Include bodies in dumps.
    pub body: bool,

    /// Largest request body buffered for a dump, in bytes.
    pub max_body_bytes: usize,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            body: false,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed until the destination's response headers arrive, in seconds.
    /// Streaming bodies are not bounded by it.
    pub request_secs: Option<u64>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or an EnvFilter directive.
    pub log_level: String,

    /// Append logs to this file instead of stdout.
    pub log_file: Option<PathBuf>,

    /// Emit JSON log lines.
    pub json: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
            json: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

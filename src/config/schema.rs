//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from a TOML
//! config file; every field has a default so the service runs with no
//! file at all.

use serde::{Deserialize, Serialize};

/// Root configuration for the status service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name attached to every telemetry signal.
    pub service_name: String,

    /// Status server settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Polling client settings.
    pub client: ClientConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: "status-service".to_string(),
            server: ServerConfig::default(),
            observability: ObservabilityConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

/// Status server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Per-request timeout in seconds; bounds worst-case resource
    /// hold time per connection.
    pub request_timeout_secs: u64,

    /// Grace period for draining in-flight requests and running
    /// shutdown actions, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 10,
            shutdown_grace_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log level; `RUST_LOG` overrides it.
    pub log_level: String,

    /// Enable the metrics exposition endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Export finished spans as structured log lines.
    pub stdout_traces: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
            stdout_traces: false,
        }
    }
}

/// Polling client configuration. `HOST` and `PORT` environment
/// variables override the target address.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Target service host.
    pub host: String,

    /// Target service port.
    pub port: u16,

    /// Status poll interval in seconds.
    pub poll_interval_secs: u64,

    /// Flaky toggle interval in seconds.
    pub flaky_interval_secs: u64,

    /// Outbound request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
            poll_interval_secs: 3,
            flaky_interval_secs: 10,
            request_timeout_secs: 5,
        }
    }
}

//! Configuration loading.
//!
//! Defaults, optionally overridden by a TOML file, then by the
//! environment. Startup fails fast on unreadable or unparsable input.

pub mod env;
pub mod schema;

pub use schema::{ClientConfig, ObservabilityConfig, ServerConfig, ServiceConfig};

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parsing config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load configuration, starting from defaults.
pub fn load(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml::from_str(&std::fs::read_to_string(path)?)?,
        None => ServiceConfig::default(),
    };
    env::apply_overrides(&mut config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_constants() {
        let config = ServiceConfig::default();
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.observability.metrics_address, "0.0.0.0:9090");
        assert_eq!(config.client.poll_interval_secs, 3);
        assert_eq!(config.client.flaky_interval_secs, 10);
        assert_eq!(config.client.request_timeout_secs, 5);
    }

    #[test]
    fn partial_toml_keeps_defaults_elsewhere() {
        let config: ServiceConfig = toml::from_str(
            r#"
            service_name = "renamed"

            [server]
            bind_address = "127.0.0.1:18080"
            "#,
        )
        .unwrap();
        assert_eq!(config.service_name, "renamed");
        assert_eq!(config.server.bind_address, "127.0.0.1:18080");
        assert_eq!(config.server.request_timeout_secs, 10);
        assert!(config.observability.metrics_enabled);
    }
}

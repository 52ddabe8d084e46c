//! Environment variable overrides.
//!
//! Applied after file loading, so the environment wins. Overrides go
//! through a lookup function, keeping tests independent of process
//! environment mutation.

use crate::config::ServiceConfig;

/// Apply `HOST` / `PORT` overrides from the process environment.
pub fn apply_overrides(config: &mut ServiceConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

pub(crate) fn apply_overrides_from(
    config: &mut ServiceConfig,
    get: impl Fn(&str) -> Option<String>,
) {
    if let Some(host) = get("HOST").filter(|h| !h.is_empty()) {
        config.client.host = host;
    }
    if let Some(port) = get("PORT") {
        match port.parse::<u16>() {
            Ok(port) => config.client.port = port,
            Err(_) => tracing::warn!(port = %port, "ignoring unparsable PORT override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_and_port_override_the_defaults() {
        let mut config = ServiceConfig::default();
        apply_overrides_from(&mut config, |key| match key {
            "HOST" => Some("status.internal".to_string()),
            "PORT" => Some("9999".to_string()),
            _ => None,
        });
        assert_eq!(config.client.host, "status.internal");
        assert_eq!(config.client.port, 9999);
    }

    #[test]
    fn unset_or_invalid_values_keep_defaults() {
        let mut config = ServiceConfig::default();
        apply_overrides_from(&mut config, |key| match key {
            "HOST" => Some(String::new()),
            "PORT" => Some("not-a-port".to_string()),
            _ => None,
        });
        assert_eq!(config.client.host, "localhost");
        assert_eq!(config.client.port, 8080);
    }
}

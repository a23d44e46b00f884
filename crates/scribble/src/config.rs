//! Process-level server settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Port used when neither `SCRIBBLE_BIND` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 3000;

/// How long a connection may stay silent before it is treated as gone.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the server listens and how it treats silent clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `0.0.0.0:3000`.
    pub bind: String,

    /// A connection that sends nothing for this long is disconnected.
    /// Clients keep themselves alive with `heartbeat`.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: format!("0.0.0.0:{DEFAULT_PORT}"),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    /// Reads the bind address from the environment.
    ///
    /// `SCRIBBLE_BIND` wins; otherwise `PORT` is bound on all interfaces;
    /// otherwise port 3000.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind = match (non_empty("SCRIBBLE_BIND"), non_empty("PORT")) {
            (Some(bind), _) => bind.trim().to_string(),
            (None, Some(port)) => match port.trim().parse::<u16>() {
                Ok(port) => format!("0.0.0.0:{port}"),
                Err(_) => {
                    tracing::warn!(%port, "ignoring invalid PORT");
                    format!("0.0.0.0:{DEFAULT_PORT}")
                }
            },
            (None, None) => format!("0.0.0.0:{DEFAULT_PORT}"),
        };

        Self {
            bind,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config.bind, "0.0.0.0:3000");
        assert_eq!(config.idle_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_port_binds_all_interfaces() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "8080")]));
        assert_eq!(config.bind, "0.0.0.0:8080");
    }

    #[test]
    fn test_scribble_bind_overrides_port() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("SCRIBBLE_BIND", "127.0.0.1:9000"),
        ]));
        assert_eq!(config.bind, "127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_or_blank_port_falls_back() {
        for port in ["http", "70000", "  "] {
            let config = ServerConfig::from_lookup(lookup(&[("PORT", port)]));
            assert_eq!(config.bind, "0.0.0.0:3000", "PORT={port:?}");
        }
    }
}

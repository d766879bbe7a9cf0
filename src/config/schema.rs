//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Which relay variant this process runs.
    pub mode: RelayMode,

    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Forward mode settings.
    pub forward: ForwardConfig,

    /// Render mode settings.
    pub render: RenderConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Relay variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    /// Drive a headless browser and return the rendered document.
    Render,
    /// Relay traffic under a path prefix to a fixed upstream.
    #[default]
    Forward,
}

impl RelayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMode::Render => "render",
            RelayMode::Forward => "forward",
        }
    }
}

impl std::str::FromStr for RelayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "render" => Ok(RelayMode::Render),
            "forward" => Ok(RelayMode::Forward),
            other => Err(format!("unknown relay mode `{}` (expected render or forward)", other)),
        }
    }
}

impl std::fmt::Display for RelayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// Listening port. `PORT` in the environment overrides it.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Forward mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwardConfig {
    /// Upstream origin every relayed request goes to.
    pub upstream: String,

    /// Path prefix stripped before forwarding (e.g. "/proxy").
    pub path_prefix: String,

    /// Strip `X-Forwarded-*` from outbound requests.
    pub hardened: bool,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            upstream: "https://lmarena.ai".to_string(),
            path_prefix: "/proxy".to_string(),
            hardened: true,
        }
    }
}

/// Render mode configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Page the browser navigates to.
    pub target_url: String,

    /// WebDriver endpoint used to launch browser sessions (chromedriver).
    pub webdriver_url: String,

    /// Maximum concurrent browser sessions. Further requests queue.
    pub max_sessions: usize,

    /// Upper bound for navigation plus network idle wait, in seconds.
    pub navigation_timeout_secs: u64,

    /// Quiet period with no new network activity, in milliseconds.
    pub idle_window_ms: u64,

    /// Status code used for the "Error accessing site" response.
    pub failure_status: u16,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_url: "https://lmarena.ai".to_string(),
            webdriver_url: "http://localhost:9515".to_string(),
            max_sessions: 4,
            navigation_timeout_secs: 30,
            idle_window_ms: 500,
            failure_status: 200,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human readable or JSON lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_hardened_forwarding() {
        let config = RelayConfig::default();
        assert_eq!(config.listener.port, 3000);
        assert_eq!(config.mode, RelayMode::Forward);
        assert_eq!(config.forward.upstream, "https://lmarena.ai");
        assert_eq!(config.forward.path_prefix, "/proxy");
        assert!(config.forward.hardened);
        assert_eq!(config.render.failure_status, 200);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            mode = "render"

            [render]
            max_sessions = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, RelayMode::Render);
        assert_eq!(config.render.max_sessions, 2);
        assert_eq!(config.render.target_url, "https://lmarena.ai");
        assert_eq!(config.listener.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("RENDER".parse::<RelayMode>().unwrap(), RelayMode::Render);
        assert_eq!(" forward ".parse::<RelayMode>().unwrap(), RelayMode::Forward);
        assert!("mirror".parse::<RelayMode>().is_err());
    }
}

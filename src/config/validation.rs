//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics (well-formed URLs,
//! sane ranges). Every problem is reported, not just the first.

use tokio::sync::Semaphore;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a configuration before it is accepted into the system.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(message) = check_origin_url(&config.forward.upstream) {
        errors.push(ValidationError::new("forward.upstream", message));
    }

    let prefix = &config.forward.path_prefix;
    if !prefix.starts_with('/') {
        errors.push(ValidationError::new("forward.path_prefix", "must start with '/'"));
    } else if prefix.len() < 2 || prefix.ends_with('/') {
        errors.push(ValidationError::new(
            "forward.path_prefix",
            "must name a segment and not end with '/'",
        ));
    }

    if let Err(message) = check_origin_url(&config.render.target_url) {
        errors.push(ValidationError::new("render.target_url", message));
    }
    if let Err(message) = check_origin_url(&config.render.webdriver_url) {
        errors.push(ValidationError::new("render.webdriver_url", message));
    }

    if config.render.max_sessions == 0 {
        errors.push(ValidationError::new("render.max_sessions", "must be at least 1"));
    } else if config.render.max_sessions > Semaphore::MAX_PERMITS {
        errors.push(ValidationError::new(
            "render.max_sessions",
            format!("must not exceed {}", Semaphore::MAX_PERMITS),
        ));
    }
    if config.render.navigation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "render.navigation_timeout_secs",
            "must be greater than 0",
        ));
    }
    if axum::http::StatusCode::from_u16(config.render.failure_status).is_err() {
        errors.push(ValidationError::new(
            "render.failure_status",
            format!("{} is not a valid status code", config.render.failure_status),
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_origin_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| format!("`{}` is not a valid URL: {}", raw, e))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme `{}`", other)),
    }
    if url.host_str().is_none() {
        return Err(format!("`{}` has no host", raw));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&RelayConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_error() {
        let mut config = RelayConfig::default();
        config.forward.upstream = "lmarena".into();
        config.forward.path_prefix = "proxy".into();
        config.render.max_sessions = 0;
        config.render.failure_status = 42;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "forward.upstream",
                "forward.path_prefix",
                "render.max_sessions",
                "render.failure_status",
            ]
        );
    }

    #[test]
    fn session_cap_is_bounded() {
        let mut config = RelayConfig::default();
        config.render.max_sessions = Semaphore::MAX_PERMITS;
        assert!(validate_config(&config).is_ok());

        config.render.max_sessions = Semaphore::MAX_PERMITS + 1;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "render.max_sessions");
        assert!(errors[0].message.contains("must not exceed"));
    }

    #[test]
    fn rejects_non_http_upstream() {
        let mut config = RelayConfig::default();
        config.forward.upstream = "ftp://lmarena.ai".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].message.contains("unsupported scheme"));
    }

    #[test]
    fn rejects_trailing_slash_prefix() {
        let mut config = RelayConfig::default();
        config.forward.path_prefix = "/proxy/".into();
        assert!(validate_config(&config).is_err());

        config.forward.path_prefix = "/".into();
        assert!(validate_config(&config).is_err());
    }
}

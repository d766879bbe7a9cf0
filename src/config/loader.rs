//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::{RelayConfig, RelayMode};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the listening port.
pub const PORT_ENV: &str = "PORT";
/// Environment variable selecting the relay variant.
pub const MODE_ENV: &str = "RELAY_MODE";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid environment variable {name}: {message}")]
    Env { name: &'static str, message: String },
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RelayConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts `std::env::var` so callers (and tests) control the source.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(PORT_ENV).filter(|v| !v.trim().is_empty()) {
        config.listener.port = raw.trim().parse().map_err(|e| ConfigError::Env {
            name: PORT_ENV,
            message: format!("`{}`: {}", raw, e),
        })?;
    }

    if let Some(raw) = lookup(MODE_ENV).filter(|v| !v.trim().is_empty()) {
        config.mode = raw
            .parse::<RelayMode>()
            .map_err(|message| ConfigError::Env { name: MODE_ENV, message })?;
    }

    Ok(())
}

/// Build the startup configuration: defaults or file, then environment, then
/// an explicit mode override, then validation.
pub fn resolve_config(
    path: Option<&Path>,
    mode_override: Option<RelayMode>,
) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => RelayConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    if let Some(mode) = mode_override {
        config.mode = mode;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

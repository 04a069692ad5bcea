//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `listener.port`.
pub const PORT_ENV: &str = "PORT";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load, apply environment overrides to, and validate a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: GatewayConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
    finish(config)
}

/// Load the file when one is given, otherwise start from the defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => finish(GatewayConfig::default()),
    }
}

fn finish(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    let raw = std::env::var(PORT_ENV).ok();
    config.listener.port = resolve_port(raw.as_deref(), config.listener.port);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Pick the listening port from a raw `PORT` value.
///
/// Unset, non-numeric, out-of-range and zero values fall back to `fallback`.
pub fn resolve_port(raw: Option<&str>, fallback: u16) -> u16 {
    let Some(raw) = raw else {
        return fallback;
    };

    match raw.trim().parse::<u16>() {
        Ok(port) if port != 0 => port,
        _ => {
            tracing::warn!(
                value = raw,
                fallback,
                "Ignoring unusable {} value",
                PORT_ENV
            );
            fallback
        }
    }
}

//! Gateway-level error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::lifecycle::phase::InvalidTransition;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Asset root {path:?} is not a readable directory")]
    MissingAssetRoot { path: PathBuf },

    #[error("Invalid listener address: {0}")]
    ListenerAddress(#[from] std::net::AddrParseError),

    #[error("Invalid header value: {0}")]
    HeaderValue(#[from] axum::http::header::InvalidHeaderValue),

    #[error("Invalid relay upstream {upstream:?}: {reason}")]
    RelayUpstream { upstream: String, reason: String },

    #[error("Network error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] InvalidTransition),

    #[error("Metrics exporter failed: {0}")]
    Metrics(String),

    /// Returned from the connection service to make hyper drop an
    /// unmatched upgrade without writing a response.
    #[error("Upgrade on unrouted path {path:?} closed")]
    UpgradeRejected { path: String },
}

pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Port used when neither the config file nor `PORT` provides a usable one.
pub const DEFAULT_PORT: u16 = 8080;

/// Root configuration for the relay gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind host, port, connection limit).
    pub listener: ListenerConfig,

    /// Static asset mounts, checked in registration order.
    pub mounts: Vec<MountConfig>,

    /// Exact-path aliases served before any mount is consulted.
    pub aliases: Vec<AliasConfig>,

    /// Relay backend and the prefixes routed to it.
    pub relay: RelayConfig,

    /// Cross-origin isolation headers stamped on every response.
    pub isolation: IsolationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            mounts: vec![
                MountConfig::new("/uv/", "assets/uv", false),
                MountConfig::new("/epoxy/", "assets/epoxy", false),
                MountConfig::new("/baremux/", "assets/baremux", false),
                MountConfig::new("/", "assets/public", true),
            ],
            aliases: vec![AliasConfig {
                path: "/uv/uv.config.js".to_string(),
                file: PathBuf::from("assets/public/uv/uv.config.js"),
            }],
            relay: RelayConfig::default(),
            isolation: IsolationConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind host. Must be an unspecified address (`0.0.0.0` or `::`).
    pub host: String,

    /// Bind port. `PORT` in the environment takes precedence when valid.
    pub port: u16,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl ListenerConfig {
    /// Socket address the gateway binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self.host.parse()?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_connections: 10_000,
        }
    }
}

/// A static asset mount: `prefix` is served from `root`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MountConfig {
    /// URL prefix, starting and ending with `/`.
    pub prefix: String,

    /// Directory holding the assets.
    pub root: PathBuf,

    /// Serve `index.html` for directory requests.
    #[serde(default)]
    pub indexable: bool,
}

impl MountConfig {
    pub fn new(prefix: impl Into<String>, root: impl Into<PathBuf>, indexable: bool) -> Self {
        Self {
            prefix: prefix.into(),
            root: root.into(),
            indexable,
        }
    }
}

/// A single file served from a path unrelated to its location on disk.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AliasConfig {
    /// Exact request path.
    pub path: String,

    /// File served for that path.
    pub file: PathBuf,
}

/// Which relay implementation handles relay-bound traffic.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RelayBackend {
    /// HTTP relay process (request forwarding plus upgrade splicing).
    #[default]
    Http,
    /// WebSocket tunnel endpoint (upgrades only).
    Websocket,
}

impl std::fmt::Display for RelayBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayBackend::Http => write!(f, "http"),
            RelayBackend::Websocket => write!(f, "websocket"),
        }
    }
}

/// Relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Backend implementation selected at startup.
    pub backend: RelayBackend,

    /// Base URL of the external relay (`http://` or `ws://`).
    pub upstream: String,

    /// Prefixes routed to the relay, checked in registration order.
    pub prefixes: Vec<RelayPrefixConfig>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            backend: RelayBackend::Http,
            upstream: "http://127.0.0.1:8081".to_string(),
            prefixes: vec![
                RelayPrefixConfig {
                    prefix: "/bare/".to_string(),
                    rewrite_to: None,
                },
                RelayPrefixConfig {
                    prefix: "/service/".to_string(),
                    rewrite_to: Some("/bare/".to_string()),
                },
            ],
        }
    }
}

/// A relay-bound prefix, optionally rewritten before delegation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RelayPrefixConfig {
    /// Prefix matched against the request path.
    pub prefix: String,

    /// Replacement for `prefix` in the path handed to the relay.
    #[serde(default)]
    pub rewrite_to: Option<String>,
}

/// Cross-origin isolation header values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IsolationConfig {
    /// `Cross-Origin-Opener-Policy` value.
    pub opener_policy: String,

    /// `Cross-Origin-Embedder-Policy` value.
    pub embedder_policy: String,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        Self {
            opener_policy: "same-origin".to_string(),
            embedder_policy: "require-corp".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
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
    /// Filter directive used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter listen address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "relay_gateway=info,tower_http=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

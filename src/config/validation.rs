//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check prefix shapes and detect shadowed mounts
//! - Validate value ranges (port, connection limit)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Filesystem checks happen at startup, not here

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderValue;

use crate::config::schema::{GatewayConfig, RelayBackend};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidPort,
    HostNotUnspecified(String),
    ZeroConnections,
    MalformedPrefix { field: &'static str, prefix: String },
    DuplicateMount(String),
    ShadowedMount { prefix: String, by: String },
    MountShadowedByRelay { prefix: String, relay: String },
    DuplicateRelayPrefix(String),
    MalformedAlias(String),
    DuplicateAlias(String),
    InvalidUpstream { backend: RelayBackend, upstream: String },
    InvalidHeaderValue { header: &'static str, value: String },
    InvalidMetricsAddress(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidPort => write!(f, "listener.port must be non-zero"),
            ValidationError::HostNotUnspecified(host) => {
                write!(f, "listener.host {:?} must be 0.0.0.0 or ::", host)
            }
            ValidationError::ZeroConnections => {
                write!(f, "listener.max_connections must be greater than zero")
            }
            ValidationError::MalformedPrefix { field, prefix } => {
                write!(f, "{} {:?} must start and end with '/'", field, prefix)
            }
            ValidationError::DuplicateMount(prefix) => {
                write!(f, "mount prefix {:?} registered twice", prefix)
            }
            ValidationError::ShadowedMount { prefix, by } => {
                write!(f, "mount {:?} is unreachable behind earlier mount {:?}", prefix, by)
            }
            ValidationError::MountShadowedByRelay { prefix, relay } => {
                write!(f, "mount {:?} is unreachable behind relay prefix {:?}", prefix, relay)
            }
            ValidationError::DuplicateRelayPrefix(prefix) => {
                write!(f, "relay prefix {:?} registered twice", prefix)
            }
            ValidationError::MalformedAlias(path) => {
                write!(f, "alias path {:?} must start with '/'", path)
            }
            ValidationError::DuplicateAlias(path) => {
                write!(f, "alias path {:?} registered twice", path)
            }
            ValidationError::InvalidUpstream { backend, upstream } => {
                write!(f, "relay.upstream {:?} is not a valid {} relay URL", upstream, backend)
            }
            ValidationError::InvalidHeaderValue { header, value } => {
                write!(f, "{} value {:?} is not a valid header value", header, value)
            }
            ValidationError::InvalidMetricsAddress(addr) => {
                write!(f, "observability.metrics_address {:?} is not a socket address", addr)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn is_well_formed_prefix(prefix: &str) -> bool {
    prefix.starts_with('/') && prefix.ends_with('/')
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    match config.listener.host.parse::<IpAddr>() {
        Ok(ip) if ip.is_unspecified() => {}
        _ => errors.push(ValidationError::HostNotUnspecified(config.listener.host.clone())),
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroConnections);
    }

    for relay in &config.relay.prefixes {
        if !is_well_formed_prefix(&relay.prefix) {
            errors.push(ValidationError::MalformedPrefix {
                field: "relay prefix",
                prefix: relay.prefix.clone(),
            });
        }
        if let Some(target) = &relay.rewrite_to {
            if !is_well_formed_prefix(target) {
                errors.push(ValidationError::MalformedPrefix {
                    field: "relay rewrite_to",
                    prefix: target.clone(),
                });
            }
        }
    }
    for (i, relay) in config.relay.prefixes.iter().enumerate() {
        if config.relay.prefixes[..i].iter().any(|r| r.prefix == relay.prefix) {
            errors.push(ValidationError::DuplicateRelayPrefix(relay.prefix.clone()));
        }
    }

    for (i, mount) in config.mounts.iter().enumerate() {
        if !is_well_formed_prefix(&mount.prefix) {
            errors.push(ValidationError::MalformedPrefix {
                field: "mount prefix",
                prefix: mount.prefix.clone(),
            });
            continue;
        }

        let earlier = &config.mounts[..i];
        if earlier.iter().any(|m| m.prefix == mount.prefix) {
            errors.push(ValidationError::DuplicateMount(mount.prefix.clone()));
        } else if let Some(by) = earlier.iter().find(|m| mount.prefix.starts_with(&m.prefix)) {
            errors.push(ValidationError::ShadowedMount {
                prefix: mount.prefix.clone(),
                by: by.prefix.clone(),
            });
        }

        if let Some(relay) = config
            .relay
            .prefixes
            .iter()
            .find(|r| mount.prefix.starts_with(&r.prefix))
        {
            errors.push(ValidationError::MountShadowedByRelay {
                prefix: mount.prefix.clone(),
                relay: relay.prefix.clone(),
            });
        }
    }

    for (i, alias) in config.aliases.iter().enumerate() {
        if !alias.path.starts_with('/') {
            errors.push(ValidationError::MalformedAlias(alias.path.clone()));
        }
        if config.aliases[..i].iter().any(|a| a.path == alias.path) {
            errors.push(ValidationError::DuplicateAlias(alias.path.clone()));
        }
    }

    if !upstream_matches_backend(config.relay.backend, &config.relay.upstream) {
        errors.push(ValidationError::InvalidUpstream {
            backend: config.relay.backend,
            upstream: config.relay.upstream.clone(),
        });
    }

    for (header, value) in [
        ("isolation.opener_policy", &config.isolation.opener_policy),
        ("isolation.embedder_policy", &config.isolation.embedder_policy),
    ] {
        if value.is_empty() || HeaderValue::from_str(value).is_err() {
            errors.push(ValidationError::InvalidHeaderValue {
                header,
                value: value.clone(),
            });
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn upstream_matches_backend(backend: RelayBackend, upstream: &str) -> bool {
    let Ok(url) = url::Url::parse(upstream) else {
        return false;
    };
    if url.host_str().is_none() {
        return false;
    }
    match backend {
        RelayBackend::Http => url.scheme() == "http",
        RelayBackend::Websocket => matches!(url.scheme(), "ws" | "wss"),
    }
}

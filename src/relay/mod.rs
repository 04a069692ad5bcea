//! Relay adapter subsystem.
//!
//! # Data Flow
//! ```text
//! Request classified as Relay
//!     → RelayRoute rewrite (path only)
//!     → RelayAdapter::handle_request   (plain request)
//!     → RelayAdapter::handle_upgrade   (protocol switch; adapter owns the socket)
//! ```
//!
//! # Design Decisions
//! - One adapter instance per process, chosen from config at startup
//! - The gateway never retries or rewrites what an adapter returns
//! - Adapters surface their own failures (502, 426, closed tunnel)

pub mod tunnel;
pub mod upstream;

use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response};
use futures_util::future::BoxFuture;

use crate::config::{RelayBackend, RelayConfig};
use crate::error::GatewayError;

pub use tunnel::WebSocketRelay;
pub use upstream::HttpRelay;

/// Boundary to the external relay engine.
///
/// Both operations take the request by value. For `handle_upgrade` the
/// request still carries hyper's `OnUpgrade` extension, so the adapter
/// ends up owning the raw connection once the handshake response is sent.
pub trait RelayAdapter: Send + Sync + 'static {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    fn handle_request(&self, req: Request<Body>) -> BoxFuture<'static, Response>;

    fn handle_upgrade(&self, req: Request<Body>) -> BoxFuture<'static, Response>;
}

/// Build the adapter selected by `config.backend`.
pub fn build_adapter(config: &RelayConfig) -> Result<Arc<dyn RelayAdapter>, GatewayError> {
    let adapter: Arc<dyn RelayAdapter> = match config.backend {
        RelayBackend::Http => Arc::new(HttpRelay::new(&config.upstream)?),
        RelayBackend::Websocket => Arc::new(WebSocketRelay::new(&config.upstream)?),
    };

    tracing::info!(
        backend = adapter.name(),
        upstream = %config.upstream,
        prefixes = config.prefixes.len(),
        "Relay adapter ready"
    );
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_backend_from_config() {
        let mut config = RelayConfig::default();
        assert_eq!(build_adapter(&config).unwrap().name(), "http");

        config.backend = RelayBackend::Websocket;
        config.upstream = "ws://127.0.0.1:9/wisp/".into();
        assert_eq!(build_adapter(&config).unwrap().name(), "websocket");
    }

    #[test]
    fn rejects_unusable_upstream() {
        let config = RelayConfig {
            upstream: "not a url".into(),
            ..RelayConfig::default()
        };
        assert!(build_adapter(&config).is_err());
    }
}

//! WebSocket tunnel relay adapter.
//!
//! The relay speaks its own protocol over a WebSocket. The gateway opens a
//! WebSocket to the relay for each client upgrade and pumps frames between
//! the two without looking inside them.

use axum::{
    body::Body,
    extract::{ws::WebSocketUpgrade, FromRequestParts},
    http::{header::SEC_WEBSOCKET_PROTOCOL, HeaderMap, HeaderValue, Request},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use url::Url;

use crate::error::GatewayError;
use crate::http::response::{bad_gateway, upgrade_required};
use crate::http::websocket::relay_frames;
use crate::observability::metrics;
use crate::relay::RelayAdapter;

/// Relay adapter for a WebSocket tunnel endpoint.
#[derive(Debug, Clone)]
pub struct WebSocketRelay {
    base: Url,
}

impl WebSocketRelay {
    /// `upstream` is the relay's base URL, e.g. `ws://127.0.0.1:6001`.
    pub fn new(upstream: &str) -> Result<Self, GatewayError> {
        let invalid = |reason: &str| GatewayError::RelayUpstream {
            upstream: upstream.to_string(),
            reason: reason.to_string(),
        };

        let base = Url::parse(upstream).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(base.scheme(), "ws" | "wss") {
            return Err(invalid("scheme must be ws or wss"));
        }
        if base.host_str().is_none() {
            return Err(invalid("missing host"));
        }
        Ok(Self { base })
    }

    /// Upstream URL for a client request on `path_and_query`.
    pub fn target(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base.origin().ascii_serialization(), path_and_query)
    }

    async fn tunnel(self, req: Request<Body>) -> Response {
        let (mut parts, _body) = req.into_parts();
        let requested = requested_protocols(&parts.headers);
        let upgrade = match WebSocketUpgrade::from_request_parts(&mut parts, &()).await {
            Ok(upgrade) => upgrade,
            Err(rejection) => {
                tracing::debug!(error = %rejection, "Not a WebSocket handshake");
                metrics::record_upgrade("declined");
                return rejection.into_response();
            }
        };

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let target = self.target(path_and_query);

        let mut handshake = match target.as_str().into_client_request() {
            Ok(handshake) => handshake,
            Err(e) => {
                tracing::error!(%target, error = %e, "Invalid relay WebSocket target");
                metrics::record_upgrade("failed");
                return bad_gateway("Invalid relay target");
            }
        };
        if let Some(protocols) = requested {
            handshake.headers_mut().insert(SEC_WEBSOCKET_PROTOCOL, protocols);
        }

        // The relay must accept before the client handshake completes.
        let (upstream, accepted) = match tokio_tungstenite::connect_async(handshake).await {
            Ok(connected) => connected,
            Err(e) => {
                tracing::error!(%target, error = %e, "Relay WebSocket connect failed");
                metrics::record_upgrade("failed");
                return bad_gateway("Relay connection failed");
            }
        };

        let selected = accepted
            .headers()
            .get(SEC_WEBSOCKET_PROTOCOL)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let upgrade = match selected {
            Some(protocol) => upgrade.protocols([protocol]),
            None => upgrade,
        };

        metrics::record_upgrade("relayed");
        upgrade
            .on_failed_upgrade(|e| tracing::warn!(error = %e, "Client WebSocket upgrade failed"))
            .on_upgrade(move |socket| relay_frames(socket, upstream))
    }
}

/// Subprotocols offered by the client, folded into one header value.
fn requested_protocols(headers: &HeaderMap) -> Option<HeaderValue> {
    let offered: Vec<&str> = headers
        .get_all(SEC_WEBSOCKET_PROTOCOL)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if offered.is_empty() {
        return None;
    }
    HeaderValue::from_str(&offered.join(", ")).ok()
}

impl RelayAdapter for WebSocketRelay {
    fn name(&self) -> &'static str {
        "websocket"
    }

    fn handle_request(&self, _req: Request<Body>) -> BoxFuture<'static, Response> {
        Box::pin(async { upgrade_required() })
    }

    fn handle_upgrade(&self, req: Request<Body>) -> BoxFuture<'static, Response> {
        Box::pin(self.clone().tunnel(req))
    }
}

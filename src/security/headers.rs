//! Header manipulation and security headers.
//!
//! # Responsibilities
//! - Stamp cross-origin isolation headers on every response
//! - Strip hop-by-hop headers from relayed traffic
//!
//! # Design Decisions
//! - Isolation headers override whatever a handler set, so each appears exactly once
//! - Upgrade requests keep `Connection`/`Upgrade`; the relay needs them

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::IsolationConfig;

pub const CROSS_ORIGIN_OPENER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-opener-policy");
pub const CROSS_ORIGIN_EMBEDDER_POLICY: HeaderName =
    HeaderName::from_static("cross-origin-embedder-policy");

/// Headers meaningful only for a single transport hop.
const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Parsed isolation header values.
#[derive(Debug, Clone)]
pub struct IsolationHeaders {
    opener: HeaderValue,
    embedder: HeaderValue,
}

impl IsolationHeaders {
    pub fn from_config(config: &IsolationConfig) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            opener: HeaderValue::from_str(&config.opener_policy)?,
            embedder: HeaderValue::from_str(&config.embedder_policy)?,
        })
    }

    /// Layer setting `Cross-Origin-Opener-Policy`.
    pub fn opener_layer(&self) -> SetResponseHeaderLayer<HeaderValue> {
        SetResponseHeaderLayer::overriding(CROSS_ORIGIN_OPENER_POLICY, self.opener.clone())
    }

    /// Layer setting `Cross-Origin-Embedder-Policy`.
    pub fn embedder_layer(&self) -> SetResponseHeaderLayer<HeaderValue> {
        SetResponseHeaderLayer::overriding(CROSS_ORIGIN_EMBEDDER_POLICY, self.embedder.clone())
    }

    /// Write both headers into `headers`, replacing any existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(CROSS_ORIGIN_OPENER_POLICY, self.opener.clone());
        headers.insert(CROSS_ORIGIN_EMBEDDER_POLICY, self.embedder.clone());
    }
}

/// Remove hop-by-hop headers, including any named by `Connection`.
///
/// With `keep_upgrade` the `Connection` and `Upgrade` headers survive so an
/// upgrade handshake can be forwarded.
pub fn strip_hop_by_hop(headers: &mut HeaderMap, keep_upgrade: bool) {
    if !keep_upgrade {
        let named: Vec<HeaderName> = headers
            .get_all(header::CONNECTION)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
            .collect();
        for name in named {
            headers.remove(name);
        }
        headers.remove(header::UPGRADE);
    }

    for name in HOP_BY_HOP.iter() {
        if keep_upgrade && *name == header::CONNECTION {
            continue;
        }
        headers.remove(name);
    }
}

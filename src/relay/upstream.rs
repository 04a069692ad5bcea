//! HTTP relay adapter.
//!
//! Forwards relay-bound requests to an external relay process over HTTP/1.1.
//! Bodies are streamed in both directions. Upgrades are forwarded as-is and,
//! once the upstream agrees to switch protocols, the two upgraded sockets are
//! spliced together.

use axum::{
    body::Body,
    http::{
        uri::{Authority, Scheme},
        request::Parts,
        Request, Response, StatusCode, Uri, Version,
    },
    response::IntoResponse,
};
use futures_util::future::{self, BoxFuture};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioIo},
};
use tokio::io::AsyncWriteExt;

use crate::error::GatewayError;
use crate::http::response::bad_gateway;
use crate::observability::metrics;
use crate::relay::RelayAdapter;
use crate::security::strip_hop_by_hop;

/// Relay adapter talking to an HTTP relay process.
#[derive(Clone)]
pub struct HttpRelay {
    authority: Authority,
    client: Client<HttpConnector, Body>,
}

impl HttpRelay {
    /// `upstream` is the relay's base URL, e.g. `http://127.0.0.1:8081`.
    pub fn new(upstream: &str) -> Result<Self, GatewayError> {
        let invalid = |reason: &str| GatewayError::RelayUpstream {
            upstream: upstream.to_string(),
            reason: reason.to_string(),
        };

        let uri: Uri = upstream.parse().map_err(|_| invalid("not a URI"))?;
        if uri.scheme() != Some(&Scheme::HTTP) {
            return Err(invalid("scheme must be http"));
        }
        let authority = uri.authority().cloned().ok_or_else(|| invalid("missing host"))?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(Self { authority, client })
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Point `uri` at the upstream, keeping path and query.
    fn upstream_uri(&self, uri: &Uri) -> Result<Uri, axum::http::Error> {
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()
    }

    /// Retarget `parts` at the upstream for an HTTP/1.1 hop.
    ///
    /// The legacy client only speaks HTTP/1.1 here, whatever version the
    /// client used to reach the gateway.
    fn prepare(&self, parts: &mut Parts, keep_upgrade: bool) -> Result<(), axum::http::Error> {
        parts.uri = self.upstream_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;
        strip_hop_by_hop(&mut parts.headers, keep_upgrade);
        Ok(())
    }

    async fn forward(self, req: Request<Body>) -> axum::response::Response {
        let (mut parts, body) = req.into_parts();
        if let Err(e) = self.prepare(&mut parts, false) {
            tracing::error!(error = %e, "Cannot build upstream URI");
            return bad_gateway("Invalid relay target");
        }

        match self.client.request(Request::from_parts(parts, body)).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers, false);
                Response::from_parts(parts, Body::new(body))
            }
            Err(e) => {
                tracing::error!(upstream = %self.authority, error = %e, "Relay request failed");
                bad_gateway("Relay request failed")
            }
        }
    }

    async fn forward_upgrade(self, mut req: Request<Body>) -> axum::response::Response {
        let client_upgrade = hyper::upgrade::on(&mut req);

        let (mut parts, _body) = req.into_parts();
        if let Err(e) = self.prepare(&mut parts, true) {
            tracing::error!(error = %e, "Cannot build upstream URI");
            return bad_gateway("Invalid relay target");
        }

        let mut upstream_response = match self
            .client
            .request(Request::from_parts(parts, Body::empty()))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(upstream = %self.authority, error = %e, "Relay upgrade failed");
                metrics::record_upgrade("failed");
                return bad_gateway("Relay upgrade failed");
            }
        };

        if upstream_response.status() != StatusCode::SWITCHING_PROTOCOLS {
            tracing::debug!(status = %upstream_response.status(), "Relay declined upgrade");
            metrics::record_upgrade("declined");
            return upstream_response.map(Body::new).into_response();
        }

        let upstream_upgrade = hyper::upgrade::on(&mut upstream_response);
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;
        *response.headers_mut() = upstream_response.headers().clone();

        let authority = self.authority.clone();
        tokio::spawn(async move {
            match future::try_join(client_upgrade, upstream_upgrade).await {
                Ok((client, upstream)) => {
                    let mut client = TokioIo::new(client);
                    let mut upstream = TokioIo::new(upstream);
                    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
                        Ok((sent, received)) => {
                            tracing::debug!(%authority, sent, received, "Relay tunnel closed");
                        }
                        Err(e) => tracing::debug!(%authority, error = %e, "Relay tunnel error"),
                    }
                    let _ = client.shutdown().await;
                    let _ = upstream.shutdown().await;
                }
                Err(e) => tracing::warn!(%authority, error = %e, "Upgrade handoff failed"),
            }
        });

        metrics::record_upgrade("relayed");
        response
    }
}

impl RelayAdapter for HttpRelay {
    fn name(&self) -> &'static str {
        "http"
    }

    fn handle_request(&self, req: Request<Body>) -> BoxFuture<'static, axum::response::Response> {
        Box::pin(self.clone().forward(req))
    }

    fn handle_upgrade(&self, req: Request<Body>) -> BoxFuture<'static, axum::response::Response> {
        Box::pin(self.clone().forward_upgrade(req))
    }
}

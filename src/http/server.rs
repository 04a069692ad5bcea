//! HTTP server setup and dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the debug probe and the gateway fallback
//! - Wire up middleware (isolation headers, request ID, tracing)
//! - Run the accept loop and serve each connection with upgrade support
//! - Close unmatched upgrades without writing a response
//! - Dispatch classified requests to the asset server or the relay adapter

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinSet;
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::assets;
use crate::http::request::{
    is_upgrade_request, make_span, propagate_request_id_layer, request_id, set_request_id_layer,
};
use crate::http::response::not_found;
use crate::lifecycle::phase::{GatewayPhase, PhaseTracker};
use crate::net::{Accepted, ConnectionTracker, Listener};
use crate::observability::metrics;
use crate::relay::{build_adapter, RelayAdapter};
use crate::routing::{Classification, Classifier};
use crate::security::IsolationHeaders;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<Classifier>,
    pub relay: Arc<dyn RelayAdapter>,
}

/// HTTP front door of the gateway.
pub struct HttpServer {
    router: Router,
    classifier: Arc<Classifier>,
    config: GatewayConfig,
    phase: PhaseTracker,
    connections: ConnectionTracker,
}

impl HttpServer {
    /// Build the server, compiling the classifier and selecting the relay adapter.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let relay = build_adapter(&config.relay)?;
        Self::with_relay(config, relay)
    }

    /// Build the server around an already constructed relay adapter.
    pub fn with_relay(
        config: GatewayConfig,
        relay: Arc<dyn RelayAdapter>,
    ) -> Result<Self, GatewayError> {
        let classifier = Arc::new(Classifier::from_config(&config));
        let isolation = IsolationHeaders::from_config(&config.isolation)?;

        let state = AppState {
            classifier: classifier.clone(),
            relay,
        };
        let router = Self::build_router(&isolation, state);

        Ok(Self {
            router,
            classifier,
            config,
            phase: PhaseTracker::new(),
            connections: ConnectionTracker::new(),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(isolation: &IsolationHeaders, state: AppState) -> Router {
        Router::new()
            .route("/debug", get(debug_handler))
            .fallback(gateway_handler)
            .with_state(state)
            .layer(TraceLayer::new_for_http().make_span_with(make_span::<Body>))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
            .layer(isolation.embedder_layer())
            .layer(isolation.opener_layer())
    }

    /// Observe the lifecycle phase.
    pub fn phase(&self) -> watch::Receiver<GatewayPhase> {
        self.phase.subscribe()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Serve connections from `listener` until `shutdown` fires.
    ///
    /// Shutdown stops accepting, drops the listener and aborts connection
    /// tasks. Tunnels already handed to the relay adapter run on their own
    /// tasks and are only torn down when the runtime exits.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), GatewayError> {
        let listener = Listener::new(listener, self.config.listener.max_connections);
        let addr = listener.local_addr()?;
        self.phase.advance(GatewayPhase::Listening)?;
        tracing::info!(
            address = %addr,
            max_connections = listener.capacity(),
            "HTTP server listening"
        );

        let mut tasks = JoinSet::new();
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let Accepted { stream, peer, slot } = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!(error = %e, "Accept failed");
                            continue;
                        }
                    };

                    let live = self.connections.open(peer);
                    let router = self.router.clone();
                    let classifier = self.classifier.clone();
                    tasks.spawn(async move {
                        tracing::trace!(connection = live.id(), peer = %peer, "Serving connection");
                        serve_connection(stream, peer, router, classifier).await;
                        drop(slot);
                        drop(live);
                    });
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::error!("Connection task panicked; other connections unaffected");
                        }
                    }
                }
                _ = shutdown.recv() => break,
            }
        }

        self.phase.advance(GatewayPhase::ShuttingDown)?;
        drop(listener);
        tracing::info!(
            abandoned = self.connections.live(),
            "Stopped accepting connections"
        );

        tasks.shutdown().await;
        self.phase.advance(GatewayPhase::Stopped)?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Serve one TCP connection with HTTP/1.1 upgrades and HTTP/2 enabled.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    classifier: Arc<Classifier>,
) {
    let service = service_fn(move |req: Request<Incoming>| {
        let router = router.clone();
        let classifier = classifier.clone();
        async move { route_connection_request(req, peer, router, &classifier).await }
    });

    let builder = auto::Builder::new(TokioExecutor::new());
    if let Err(e) = builder
        .serve_connection_with_upgrades(TokioIo::new(stream), service)
        .await
    {
        tracing::debug!(peer = %peer, error = %e, "Connection ended");
    }
}

/// Gate upgrades, then hand the request to the router.
///
/// An upgrade that does not classify as relay-bound fails the service call,
/// which makes hyper close the connection with nothing written.
async fn route_connection_request(
    req: Request<Incoming>,
    peer: SocketAddr,
    router: Router,
    classifier: &Classifier,
) -> Result<Response, GatewayError> {
    let mut req = req.map(Body::new);
    req.extensions_mut().insert(ConnectInfo(peer));

    if is_upgrade_request(&req) {
        let path = req.uri().path();
        if !classifier.classify(path).is_relay() {
            tracing::debug!(peer = %peer, path, "Closing unrouted upgrade");
            metrics::record_request("rejected");
            metrics::record_upgrade("closed");
            return Err(GatewayError::UpgradeRejected {
                path: path.to_string(),
            });
        }
    }

    match router.oneshot(req).await {
        Ok(response) => Ok(response),
        Err(never) => match never {},
    }
}

/// Liveness probe.
async fn debug_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

/// Classify the request and dispatch it.
async fn gateway_handler(State(state): State<AppState>, req: Request<Body>) -> Response {
    let path = req.uri().path().to_string();
    let classification = state.classifier.classify(&path);
    metrics::record_request(classification.label());

    match classification {
        Classification::Relay(route) => {
            let req = route.rewrite_request(req);
            tracing::debug!(
                request_id = %request_id(&req),
                backend = state.relay.name(),
                path = %req.uri().path(),
                "Relaying request"
            );
            if is_upgrade_request(&req) {
                state.relay.handle_upgrade(req).await
            } else {
                state.relay.handle_request(req).await
            }
        }
        Classification::Static(target) => assets::serve(target, req).await,
        Classification::Rejected => {
            tracing::debug!(path = %path, "No route matched");
            not_found().into_response()
        }
    }
}

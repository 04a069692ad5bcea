//! Startup orchestration.
//!
//! # Responsibilities
//! - Check that every mount root exists before binding
//! - Start the metrics exporter when enabled
//! - Build the server and bind the listener
//! - Report where the gateway is reachable
//! - Run until a termination signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - A missing alias file is only a warning; requests for it answer 404

use std::net::{IpAddr, SocketAddr};

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Verify that each mount root is a directory.
pub fn check_asset_roots(config: &GatewayConfig) -> Result<(), GatewayError> {
    for mount in &config.mounts {
        if !mount.root.is_dir() {
            return Err(GatewayError::MissingAssetRoot {
                path: mount.root.clone(),
            });
        }
    }

    for alias in &config.aliases {
        if !alias.file.is_file() {
            tracing::warn!(
                path = %alias.path,
                file = %alias.file.display(),
                "Alias target missing; requests will answer 404"
            );
        }
    }
    Ok(())
}

/// URLs a user can open to reach a gateway bound on `bind`.
pub fn reachable_addresses(bind: SocketAddr, hostname: Option<String>) -> Vec<String> {
    let port = bind.port();
    let mut addresses = vec![format!("http://localhost:{}", port)];

    if let Some(name) = hostname.filter(|n| !n.is_empty() && n != "localhost") {
        addresses.push(format!("http://{}:{}", name, port));
    }

    let literal = match bind.ip() {
        IpAddr::V4(ip) => format!("http://{}:{}", ip, port),
        IpAddr::V6(ip) => format!("http://[{}]:{}", ip, port),
    };
    if !addresses.contains(&literal) {
        addresses.push(literal);
    }
    addresses
}

fn log_reachable_addresses(bind: SocketAddr) {
    let hostname = hostname::get()
        .ok()
        .map(|h| h.to_string_lossy().into_owned());

    for address in reachable_addresses(bind, hostname) {
        tracing::info!(%address, "Gateway reachable");
    }
}

/// Start the gateway and run it until SIGINT or SIGTERM.
pub async fn start(config: GatewayConfig) -> Result<(), GatewayError> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "relay-gateway starting");

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    check_asset_roots(&config)?;
    tracing::info!(
        mounts = config.mounts.len(),
        aliases = config.aliases.len(),
        relay_prefixes = config.relay.prefixes.len(),
        backend = %config.relay.backend,
        "Configuration loaded"
    );

    let addr = config.listener.socket_addr()?;
    let server = HttpServer::new(config)?;
    let listener = TcpListener::bind(addr).await?;
    log_reachable_addresses(listener.local_addr()?);

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    shutdown.trigger_on_signal();

    server.run(listener, receiver).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

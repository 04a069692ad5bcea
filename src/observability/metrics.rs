//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by classification
//! - `gateway_upgrades_total` (counter): upgrade attempts by outcome
//! - `gateway_active_connections` (gauge): current connection count
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::GatewayError;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), GatewayError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| GatewayError::Metrics(e.to_string()))?;

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(class: &'static str) {
    metrics::counter!("gateway_requests_total", "class" => class).increment(1);
}

pub fn record_upgrade(outcome: &'static str) {
    metrics::counter!("gateway_upgrades_total", "outcome" => outcome).increment(1);
}

pub fn set_active_connections(count: usize) {
    metrics::gauge!("gateway_active_connections").set(count as f64);
}

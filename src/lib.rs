//! Path-based relay gateway.
//!
//! Serves static front-end bundles from mounted directories, forwards
//! relay-bound paths to an external relay process and hands protocol
//! upgrades on those paths to the relay adapter.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod relay;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

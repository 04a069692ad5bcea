//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (hyper connection, upgrade gate, Axum router)
//!     → request.rs (request ID, upgrade detection, trace span)
//!     → routing::Classifier
//!         → assets.rs     (Static: mounts and aliases)
//!         → relay adapter (Relay: plain requests and upgrades)
//!         → response.rs   (Rejected: 404)
//!     → isolation headers on every response
//! ```

pub mod assets;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};

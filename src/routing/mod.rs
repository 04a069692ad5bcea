//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → classifier.rs (relay prefixes → aliases → mounts)
//!     → matcher.rs (prefix tests and rewrites)
//!     → Return: Relay, Static or Rejected
//!
//! Compilation (at startup):
//!     GatewayConfig
//!     → RelayRoute / Alias / Mount tables in registration order
//!     → Freeze as immutable Classifier
//! ```
//!
//! # Design Decisions
//! - Tables compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always yields the same classification
//! - First match wins (registration order)

pub mod classifier;
pub mod matcher;

pub use classifier::{Alias, Classification, Classifier, Mount, RelayRoute, StaticTarget};
pub use matcher::PathPrefix;

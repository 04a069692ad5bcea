//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Every response:
//!     → headers.rs (Cross-Origin-Opener-Policy, Cross-Origin-Embedder-Policy)
//!
//! Relayed traffic:
//!     → headers.rs (strip hop-by-hop headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: unmatched upgrades are dropped, traversal is forbidden
//! - No trust in client input

pub mod headers;

pub use headers::{strip_hop_by_hop, IsolationHeaders};

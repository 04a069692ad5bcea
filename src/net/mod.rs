//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (id + live count)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection is counted so shutdown can report what it abandons

pub mod connection;
pub mod listener;

pub use connection::{ConnectionTracker, LiveConnection};
pub use listener::{AcceptError, Accepted, ConnectionSlot, Listener};

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Asset roots check → Relay adapter → Bind → Listening
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Abort connections → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//!
//! Phase (phase.rs):
//!     Starting → Listening → ShuttingDown → Stopped
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and exits non-zero
//! - Listener binds last (traffic only when ready)
//! - Shutdown does not drain: in-flight work is abandoned

pub mod phase;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use phase::{GatewayPhase, InvalidTransition, PhaseTracker};
pub use shutdown::Shutdown;

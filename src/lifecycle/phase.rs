//! Gateway process state machine.
//!
//! ```text
//! Starting → Listening → ShuttingDown → Stopped
//! ```
//!
//! `ShuttingDown` is only entered from `Listening`, and only on a shutdown
//! signal.

use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayPhase {
    Starting,
    Listening,
    ShuttingDown,
    Stopped,
}

impl GatewayPhase {
    fn next(self) -> Option<GatewayPhase> {
        match self {
            GatewayPhase::Starting => Some(GatewayPhase::Listening),
            GatewayPhase::Listening => Some(GatewayPhase::ShuttingDown),
            GatewayPhase::ShuttingDown => Some(GatewayPhase::Stopped),
            GatewayPhase::Stopped => None,
        }
    }
}

impl std::fmt::Display for GatewayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GatewayPhase::Starting => "starting",
            GatewayPhase::Listening => "listening",
            GatewayPhase::ShuttingDown => "shutting-down",
            GatewayPhase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move from {from} to {to}")]
pub struct InvalidTransition {
    pub from: GatewayPhase,
    pub to: GatewayPhase,
}

/// Owner of the current phase. Observers subscribe through `watch`.
#[derive(Debug)]
pub struct PhaseTracker {
    tx: watch::Sender<GatewayPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(GatewayPhase::Starting);
        Self { tx }
    }

    pub fn current(&self) -> GatewayPhase {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<GatewayPhase> {
        self.tx.subscribe()
    }

    /// Move to `to`, which must be the direct successor of the current phase.
    pub fn advance(&self, to: GatewayPhase) -> Result<(), InvalidTransition> {
        let from = self.current();
        if from.next() != Some(to) {
            return Err(InvalidTransition { from, to });
        }
        self.tx.send_replace(to);
        tracing::debug!(%from, %to, "Gateway phase changed");
        Ok(())
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}

//! Live connection bookkeeping.
//!
//! Each served connection holds a [`LiveConnection`]. The tracker numbers
//! them for logs and reports how many were still open when shutdown
//! abandoned them.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::observability::metrics;

#[derive(Debug, Default)]
struct Counters {
    next_id: AtomicU64,
    live: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    counters: Arc<Counters>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection from `peer`. It counts as live until dropped.
    pub fn open(&self, peer: SocketAddr) -> LiveConnection {
        let id = self.counters.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::set_active_connections(live);

        LiveConnection {
            id,
            peer,
            counters: Arc::clone(&self.counters),
        }
    }

    pub fn live(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct LiveConnection {
    id: u64,
    peer: SocketAddr,
    counters: Arc<Counters>,
}

impl LiveConnection {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        let live = self.counters.live.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_connections(live);
        tracing::trace!(connection = self.id, peer = %self.peer, "Connection finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn live_count_follows_guards() {
        let tracker = ConnectionTracker::new();
        let first = tracker.open(peer());
        let second = tracker.clone().open(peer());
        assert_eq!(tracker.live(), 2);
        assert!(second.id() > first.id());

        drop(first);
        assert_eq!(tracker.live(), 1);
        drop(second);
        assert_eq!(tracker.live(), 0);
    }

    #[test]
    fn ids_are_per_tracker() {
        let a = ConnectionTracker::new();
        let b = ConnectionTracker::new();
        assert_eq!(a.open(peer()).id(), 1);
        assert_eq!(b.open(peer()).id(), 1);
        assert_eq!(a.open(peer()).id(), 2);
    }
}

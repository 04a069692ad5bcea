//! Bounded accept loop.
//!
//! The gateway binds on all interfaces and admits at most `capacity`
//! connections at once. Once full, accepting pauses until a slot frees up;
//! the kernel backlog absorbs the burst.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Error)]
pub enum AcceptError {
    #[error("accept failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection limiter closed")]
    Closed,
}

/// A connection handed out by [`Listener::accept`].
#[derive(Debug)]
pub struct Accepted {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    /// Held for as long as the connection is served.
    pub slot: ConnectionSlot,
}

/// Listening socket plus the semaphore capping live connections.
pub struct Listener {
    socket: TcpListener,
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl Listener {
    pub fn new(socket: TcpListener, capacity: usize) -> Self {
        Self {
            socket,
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot, then for the next connection.
    pub async fn accept(&self) -> Result<Accepted, AcceptError> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| AcceptError::Closed)?;
        let (stream, peer) = self.socket.accept().await?;

        tracing::debug!(
            peer = %peer,
            free_slots = self.slots.available_permits(),
            "Accepted connection"
        );
        Ok(Accepted {
            stream,
            peer,
            slot: ConnectionSlot(permit),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn free_slots(&self) -> usize {
        self.slots.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Returns its slot to the listener when dropped, even on task abort.
#[derive(Debug)]
pub struct ConnectionSlot(#[allow(dead_code)] OwnedSemaphorePermit);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slot_is_returned_on_drop() {
        let socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let listener = Listener::new(socket, 2);
        let addr = listener.local_addr().unwrap();

        let _client = TcpStream::connect(addr).await.unwrap();
        let accepted = listener.accept().await.unwrap();
        assert_eq!(listener.free_slots(), 1);

        drop(accepted);
        assert_eq!(listener.free_slots(), listener.capacity());
    }

    #[tokio::test]
    async fn accept_waits_when_full() {
        let socket = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let listener = Listener::new(socket, 1);
        let addr = listener.local_addr().unwrap();

        let _first = TcpStream::connect(addr).await.unwrap();
        let _second = TcpStream::connect(addr).await.unwrap();
        let held = listener.accept().await.unwrap();

        let blocked =
            tokio::time::timeout(std::time::Duration::from_millis(100), listener.accept()).await;
        assert!(blocked.is_err());

        drop(held);
        assert!(listener.accept().await.is_ok());
    }
}

//! Tracking of the single live engine connection.

use crate::RelayError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tokio::sync::mpsc;

/// Process-unique identifier of an accepted engine connection.
pub type ConnectionId = u64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Work queued for a connection's writer half.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A text frame to send as-is.
    Frame(String),
    /// Send a close frame and stop serving the connection.
    Close,
}

/// Sending side of one engine connection.
///
/// The socket itself is owned by its connection task; the handle only feeds
/// that task's outbound queue, so sending never blocks the caller.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    peer: String,
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ConnectionHandle {
    /// Create a handle plus the queue its connection task must drain.
    pub fn new(peer: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            peer: peer.into(),
            tx,
        };
        (handle, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Remote address of the engine.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Whether the connection task is still accepting frames.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }

    /// Queue a text frame for delivery.
    pub fn send(&self, frame: String) -> Result<(), RelayError> {
        self.tx
            .send(Outbound::Frame(frame))
            .map_err(|_| RelayError::SendFailed)
    }

    /// Ask the connection task to close the socket. No-op if already gone.
    pub fn close(&self) {
        let _ = self.tx.send(Outbound::Close);
    }
}

/// Observable registry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    /// No engine connected.
    Idle,
    /// An engine is connected.
    Active(ConnectionId),
}

/// Holds the current engine connection, if any.
#[derive(Debug, Default)]
pub struct Registry {
    current: RwLock<Option<ConnectionHandle>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `handle` current, returning the connection it supersedes.
    pub fn set(&self, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        current.replace(handle)
    }

    /// Clear the registry if `id` is still the current connection.
    ///
    /// Returns `false` for a stale id, leaving the registry untouched.
    pub fn clear_if_current(&self, id: ConnectionId) -> bool {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if current.as_ref().is_some_and(|h| h.id == id) {
            *current = None;
            true
        } else {
            false
        }
    }

    /// Unconditionally clear, returning whatever was current.
    pub fn clear(&self) -> Option<ConnectionHandle> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    pub fn current(&self) -> Option<ConnectionHandle> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_connected(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn state(&self) -> RegistryState {
        match &*self.current.read().unwrap_or_else(PoisonError::into_inner) {
            Some(handle) => RegistryState::Active(handle.id),
            None => RegistryState::Idle,
        }
    }
}

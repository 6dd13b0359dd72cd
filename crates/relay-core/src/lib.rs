//! Core of the engine relay.
//!
//! A single engine process holds a persistent connection to the relay. Callers
//! hand commands to the [`Relay`], which forwards them to whichever engine is
//! connected, and poll it for connection state and recent engine logs.
//! Transports (WebSocket, HTTP, console) live in the daemon; this crate only
//! tracks state and routes messages.

mod buffer;
mod classifier;
mod diagnostic;
mod dispatch;
mod error;
mod message;
mod registry;

pub use buffer::{LogBuffer, DEFAULT_LOG_CAPACITY};
pub use classifier::{Classification, Classifier};
pub use diagnostic::{Diagnostic, DiagnosticSink, MemorySink, TracingSink};
pub use dispatch::Dispatcher;
pub use error::RelayError;
pub use message::{CommandPayload, EventBody, EventKind, InboundMessage, OutboundMessage};
pub use registry::{ConnectionHandle, ConnectionId, Outbound, Registry, RegistryState};

use std::sync::Arc;

/// Root object owning all relay state.
///
/// Created once per process and shared (behind an `Arc`) with the engine
/// acceptor and every control surface.
pub struct Relay {
    registry: Arc<Registry>,
    logs: Arc<LogBuffer>,
    classifier: Classifier,
    dispatcher: Dispatcher,
}

impl Relay {
    /// A relay reporting diagnostics through `tracing`.
    pub fn new(log_capacity: usize) -> Self {
        Self::with_sink(log_capacity, Arc::new(TracingSink))
    }

    pub fn with_sink(log_capacity: usize, sink: Arc<dyn DiagnosticSink>) -> Self {
        let registry = Arc::new(Registry::new());
        let logs = Arc::new(LogBuffer::new(log_capacity));
        Self {
            classifier: Classifier::new(logs.clone(), sink),
            dispatcher: Dispatcher::new(registry.clone()),
            registry,
            logs,
        }
    }

    /// Register a freshly accepted engine connection.
    ///
    /// Any connection it supersedes is asked to close; its id is returned.
    pub fn attach(&self, handle: ConnectionHandle) -> Option<ConnectionId> {
        let id = handle.id();
        let previous = self.registry.set(handle)?;
        tracing::info!(
            "Engine connection {} supersedes {} ({}); closing the old one",
            id,
            previous.id(),
            previous.peer()
        );
        previous.close();
        Some(previous.id())
    }

    /// Forget connection `id` if it is still current. Stale ids are ignored.
    pub fn detach(&self, id: ConnectionId) -> bool {
        self.registry.clear_if_current(id)
    }

    pub fn classify(&self, frame: &[u8]) -> Classification {
        self.classifier.classify(frame)
    }

    pub fn dispatch(&self, command: &str, id: Option<String>) -> Result<ConnectionId, RelayError> {
        self.dispatcher.dispatch(command, id)
    }

    /// Recent engine log lines, oldest first.
    pub fn logs(&self, limit: Option<usize>) -> Vec<String> {
        self.logs.snapshot(limit)
    }

    pub fn is_connected(&self) -> bool {
        self.registry.is_connected()
    }

    pub fn state(&self) -> RegistryState {
        self.registry.state()
    }

    pub fn log_buffer(&self) -> &LogBuffer {
        &self.logs
    }

    /// Close the current engine connection, if any.
    pub fn shutdown(&self) {
        if let Some(handle) = self.registry.clear() {
            tracing::info!("Closing engine connection {}", handle.id());
            handle.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_while_idle_leaves_logs_alone() {
        let relay = Relay::with_sink(10, Arc::new(MemorySink::new()));
        relay.classify(br#"{"type":"log","payload":"boot"}"#);

        assert!(matches!(
            relay.dispatch("pie.play", None),
            Err(RelayError::NotConnected)
        ));
        assert_eq!(relay.logs(None), vec!["boot"]);
    }

    #[test]
    fn superseded_connection_is_closed() {
        let relay = Relay::new(10);
        let (first, mut first_rx) = ConnectionHandle::new("a");
        let (second, mut second_rx) = ConnectionHandle::new("b");
        let first_id = first.id();
        let second_id = second.id();

        assert_eq!(relay.attach(first), None);
        assert_eq!(relay.attach(second), Some(first_id));
        assert_eq!(first_rx.try_recv().unwrap(), Outbound::Close);

        // The old connection's close event arrives late and changes nothing.
        assert!(!relay.detach(first_id));
        assert_eq!(relay.state(), RegistryState::Active(second_id));

        relay.dispatch("pie.status", None).unwrap();
        assert!(matches!(second_rx.try_recv().unwrap(), Outbound::Frame(_)));
        assert!(first_rx.try_recv().is_err());
    }

    #[test]
    fn shutdown_closes_current() {
        let relay = Relay::new(10);
        let (handle, mut rx) = ConnectionHandle::new("a");
        relay.attach(handle);
        relay.shutdown();
        assert!(!relay.is_connected());
        assert_eq!(rx.try_recv().unwrap(), Outbound::Close);
    }
}

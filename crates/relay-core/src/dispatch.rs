//! Forwarding of caller commands to the engine.

use crate::message::OutboundMessage;
use crate::registry::{ConnectionId, Registry};
use crate::RelayError;
use std::sync::Arc;

/// Sends commands to whatever engine is currently connected.
///
/// Fire-and-forget: success means the frame was queued on the live
/// connection, not that the engine acted on it.
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Send `command` with an optional caller-supplied id.
    ///
    /// Returns the id of the connection the command was queued on.
    pub fn dispatch(&self, command: &str, id: Option<String>) -> Result<ConnectionId, RelayError> {
        if command.trim().is_empty() {
            return Err(RelayError::EmptyCommand);
        }

        let handle = self.registry.current().ok_or(RelayError::NotConnected)?;
        if !handle.is_open() {
            return Err(RelayError::SendFailed);
        }

        let frame = OutboundMessage::command(command, id).to_json()?;
        handle.send(frame)?;

        tracing::info!("Sent command to engine {}: {}", handle.peer(), command);
        Ok(handle.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ConnectionHandle, Outbound};

    #[test]
    fn idle_registry_is_not_connected() {
        let dispatcher = Dispatcher::new(Arc::new(Registry::new()));
        assert!(matches!(
            dispatcher.dispatch("pie.play", None),
            Err(RelayError::NotConnected)
        ));
    }

    #[test]
    fn empty_command_is_rejected() {
        let registry = Arc::new(Registry::new());
        let (handle, mut rx) = ConnectionHandle::new("engine");
        registry.set(handle);
        let dispatcher = Dispatcher::new(registry);

        assert!(matches!(
            dispatcher.dispatch("   ", None),
            Err(RelayError::EmptyCommand)
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn sends_exactly_one_envelope() {
        let registry = Arc::new(Registry::new());
        let (handle, mut rx) = ConnectionHandle::new("engine");
        let id = handle.id();
        registry.set(handle);
        let dispatcher = Dispatcher::new(registry);

        assert_eq!(dispatcher.dispatch("pie.play", None).unwrap(), id);
        assert_eq!(
            rx.try_recv().unwrap(),
            Outbound::Frame(r#"{"type":"command","payload":{"command":"pie.play"}}"#.into())
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn forwards_caller_id() {
        let registry = Arc::new(Registry::new());
        let (handle, mut rx) = ConnectionHandle::new("engine");
        registry.set(handle);
        let dispatcher = Dispatcher::new(registry);

        dispatcher.dispatch("stat fps", Some("abc".into())).unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            Outbound::Frame(
                r#"{"type":"command","payload":{"command":"stat fps","id":"abc"}}"#.into()
            )
        );
    }

    #[test]
    fn closing_connection_fails_send() {
        let registry = Arc::new(Registry::new());
        let (handle, rx) = ConnectionHandle::new("engine");
        registry.set(handle);
        drop(rx);
        let dispatcher = Dispatcher::new(registry);

        assert!(matches!(
            dispatcher.dispatch("pie.stop", None),
            Err(RelayError::SendFailed)
        ));
    }
}

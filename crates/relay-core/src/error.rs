//! Errors surfaced to callers of the relay.

/// Why a command could not be handed to the engine.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("command must be a non-empty string")]
    EmptyCommand,
    #[error("engine not connected")]
    NotConnected,
    #[error("engine connection is closing; command not sent")]
    SendFailed,
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
}

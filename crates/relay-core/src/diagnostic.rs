//! Where everything the engine says ends up, buffered or not.

use crate::message::EventKind;
use std::sync::{Mutex, PoisonError};

/// One observation about inbound engine traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A frame that did not parse as a known message.
    Raw { text: String },
    /// A log/info/error/meta event.
    Event {
        kind: EventKind,
        text: String,
        ts: Option<String>,
    },
    /// A command response from the engine.
    Response {
        command: String,
        success: bool,
        message: Option<String>,
    },
}

/// Receives diagnostics from the classifier.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);
}

/// Emits diagnostics as `tracing` events under the `engine` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, diagnostic: Diagnostic) {
        match diagnostic {
            Diagnostic::Raw { text } => {
                tracing::warn!(target: "engine", "[UE RAW] {}", text);
            }
            Diagnostic::Event { kind, text, ts } => {
                let ts = ts.as_deref().unwrap_or("-");
                if kind == EventKind::Error {
                    tracing::warn!(target: "engine", "[UE {}] {}: {}", ts, kind, text);
                } else {
                    tracing::info!(target: "engine", "[UE {}] {}: {}", ts, kind, text);
                }
            }
            Diagnostic::Response {
                command,
                success,
                message,
            } => {
                tracing::info!(
                    target: "engine",
                    "[UE RESPONSE] {} success={} {}",
                    command,
                    success,
                    message.as_deref().unwrap_or("")
                );
            }
        }
    }
}

/// Keeps diagnostics in memory. Handy for tests and status pages.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, diagnostic: Diagnostic) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }
}

//! Routing of inbound engine frames.

use crate::buffer::LogBuffer;
use crate::diagnostic::{Diagnostic, DiagnosticSink};
use crate::message::{EventBody, EventKind, InboundMessage};
use std::sync::Arc;

/// What happened to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Unparseable; reported raw.
    Raw,
    /// A log line, appended to the buffer and reported.
    Buffered,
    /// Reported only.
    Reported,
}

/// Parses engine frames and routes them to the log buffer and diagnostic sink.
///
/// Never fails: malformed input is reported and dropped, and the connection
/// it came from stays open.
pub struct Classifier {
    logs: Arc<LogBuffer>,
    sink: Arc<dyn DiagnosticSink>,
}

impl Classifier {
    pub fn new(logs: Arc<LogBuffer>, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { logs, sink }
    }

    pub fn classify(&self, frame: &[u8]) -> Classification {
        let message = match InboundMessage::from_slice(frame) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!("Unparseable engine frame: {}", e);
                self.sink.record(Diagnostic::Raw {
                    text: String::from_utf8_lossy(frame).into_owned(),
                });
                return Classification::Raw;
            }
        };

        match message {
            InboundMessage::Log(body) => {
                let text = body.text();
                self.logs.append(text.clone());
                self.report(EventKind::Log, text, body.ts);
                Classification::Buffered
            }
            InboundMessage::Info(body) => self.report_body(EventKind::Info, body),
            InboundMessage::Error(body) => self.report_body(EventKind::Error, body),
            InboundMessage::Meta(body) => self.report_body(EventKind::Meta, body),
            InboundMessage::Response {
                command,
                success,
                message,
                ts: _,
            } => {
                self.sink.record(Diagnostic::Response {
                    command,
                    success,
                    message,
                });
                Classification::Reported
            }
        }
    }

    fn report_body(&self, kind: EventKind, body: EventBody) -> Classification {
        self.report(kind, body.text(), body.ts);
        Classification::Reported
    }

    fn report(&self, kind: EventKind, text: String, ts: Option<String>) {
        self.sink.record(Diagnostic::Event { kind, text, ts });
    }
}

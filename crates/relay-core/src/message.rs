//! Wire messages exchanged with the engine.
//!
//! Every frame is a single JSON object tagged by its `type` field. Inbound
//! frames are a closed set of variants; anything else is treated as raw input
//! by the classifier.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Messages sent from the engine to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// Engine log line. The only kind kept in the log buffer.
    Log(EventBody),
    /// Informational event.
    Info(EventBody),
    /// Engine-side error report.
    Error(EventBody),
    /// Engine metadata (version, project, etc).
    Meta(EventBody),
    /// Outcome of a previously sent command. Not matched against anything.
    Response {
        #[serde(default)]
        command: String,
        #[serde(default)]
        success: bool,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        ts: Option<String>,
    },
}

impl InboundMessage {
    /// Parse one frame.
    pub fn from_slice(frame: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(frame)
    }
}

/// Body shared by the free-form event kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventBody {
    /// Arbitrary JSON payload.
    #[serde(default)]
    pub payload: Value,
    /// Engine-supplied ISO-8601 timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

impl EventBody {
    /// Render the payload as text: strings verbatim, other values as compact
    /// JSON, a missing payload as the empty string.
    pub fn text(&self) -> String {
        match &self.payload {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// The free-form event kinds, used to annotate diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Log,
    Info,
    Error,
    Meta,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Log => "LOG",
            EventKind::Info => "INFO",
            EventKind::Error => "ERROR",
            EventKind::Meta => "META",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Messages sent from the relay to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// A console command for the engine to execute.
    Command { payload: CommandPayload },
}

impl OutboundMessage {
    /// Build a command envelope.
    pub fn command(command: impl Into<String>, id: Option<String>) -> Self {
        Self::Command {
            payload: CommandPayload {
                command: command.into(),
                id,
            },
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Payload of a command envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub command: String,
    /// Caller-supplied correlation id; opaque to the relay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_log() {
        let msg = InboundMessage::from_slice(br#"{"type":"log","payload":"hello"}"#).unwrap();
        let InboundMessage::Log(body) = msg else {
            panic!("expected a log message");
        };
        assert_eq!(body.text(), "hello");
        assert_eq!(body.ts, None);
    }

    #[test]
    fn parse_response() {
        let msg = InboundMessage::from_slice(
            br#"{"type":"response","command":"pie.status","success":true,"message":"Playing"}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            InboundMessage::Response {
                command: "pie.status".into(),
                success: true,
                message: Some("Playing".into()),
                ts: None,
            }
        );
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(InboundMessage::from_slice(br#"{"type":"telemetry","payload":1}"#).is_err());
        assert!(InboundMessage::from_slice(br#"{"payload":"no tag"}"#).is_err());
    }

    #[test]
    fn payload_rendering() {
        let body = EventBody {
            payload: json!({"fps": 60}),
            ts: None,
        };
        assert_eq!(body.text(), r#"{"fps":60}"#);
        assert_eq!(EventBody::default().text(), "");
    }

    #[test]
    fn command_envelope_shape() {
        let envelope = OutboundMessage::command("pie.play", None);
        let value: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"type": "command", "payload": {"command": "pie.play"}})
        );

        let envelope = OutboundMessage::command("stat fps", Some("42".into()));
        let value: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(value["payload"]["id"], "42");
    }
}

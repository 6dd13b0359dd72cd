//! Tools exposed to the caller, each a thin wrapper over one relay API call.

use crate::client::ControlApi;
use serde_json::{json, Value};

/// Number of log lines returned by `ue_logs`.
const LOG_TAIL: usize = 20;

/// Text result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut result = json!({
            "content": [{ "type": "text", "text": self.text }],
        });
        if self.is_error {
            result["isError"] = Value::Bool(true);
        }
        result
    }
}

/// Tool descriptors for `tools/list`.
pub fn definitions() -> Value {
    let no_args = json!({ "type": "object", "properties": {} });
    json!([
        { "name": "ue_status", "description": "Check UE connection status", "inputSchema": no_args },
        { "name": "ue_play", "description": "Start PIE", "inputSchema": no_args },
        { "name": "ue_stop", "description": "Stop PIE", "inputSchema": no_args },
        { "name": "ue_pie_status", "description": "Get PIE status", "inputSchema": no_args },
        {
            "name": "ue_exec",
            "description": "Execute UE console command",
            "inputSchema": {
                "type": "object",
                "properties": { "command": { "type": "string" } },
                "required": ["command"]
            }
        },
        { "name": "ue_logs", "description": "Get recent UE logs", "inputSchema": no_args },
    ])
}

pub async fn call<A: ControlApi>(api: &A, name: &str, args: &Value) -> ToolOutput {
    match name {
        "ue_status" => {
            // Any failure to reach the relay counts as "not connected".
            let connected = api.health().await.map(|h| h.ue_connected).unwrap_or(false);
            ToolOutput::ok(if connected {
                "UE connected"
            } else {
                "UE not connected"
            })
        }
        "ue_play" => send(api, "pie.play", |_| "PIE starting".to_string()).await,
        "ue_stop" => send(api, "pie.stop", |_| "PIE stopping".to_string()).await,
        "ue_pie_status" => {
            send(api, "pie.status", |ack| {
                ack.message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "unknown".to_string())
            })
            .await
        }
        "ue_exec" => match args.get("command").and_then(Value::as_str) {
            Some(command) => send(api, command, |_| format!("Sent: {command}")).await,
            None => ToolOutput::error("missing 'command' string argument"),
        },
        "ue_logs" => match api.logs().await {
            Ok(logs) => {
                let tail = &logs[logs.len().saturating_sub(LOG_TAIL)..];
                if tail.is_empty() {
                    ToolOutput::ok("No logs")
                } else {
                    ToolOutput::ok(tail.join("\n"))
                }
            }
            Err(e) => ToolOutput::error(e.to_string()),
        },
        other => ToolOutput::error(format!("unknown tool: {other}")),
    }
}

async fn send<A, F>(api: &A, command: &str, describe: F) -> ToolOutput
where
    A: ControlApi,
    F: FnOnce(crate::client::CommandAck) -> String,
{
    match api.send_command(command).await {
        Ok(ack) if !ack.success => ToolOutput::error(
            ack.message
                .unwrap_or_else(|| format!("relay did not accept '{command}'")),
        ),
        Ok(ack) => ToolOutput::ok(describe(ack)),
        Err(e) => {
            tracing::warn!("Command '{}' failed: {}", command, e);
            ToolOutput::error(e.to_string())
        }
    }
}

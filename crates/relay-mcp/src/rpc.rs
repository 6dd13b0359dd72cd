//! JSON-RPC 2.0 request handling, one message per line.

use crate::client::ControlApi;
use crate::tools;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

#[derive(Debug, Deserialize)]
struct Request {
    /// Absent for notifications. An explicit `null` is still a request.
    #[serde(default, deserialize_with = "present")]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// Handle one input line. Returns the response to write, if any.
pub async fn handle_line<A: ControlApi>(api: &A, line: &str) -> Option<Value> {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Invalid request: {}", e);
            return Some(error(Value::Null, PARSE_ERROR, &format!("parse error: {e}")));
        }
    };

    let Some(id) = request.id else {
        tracing::debug!("Notification: {}", request.method);
        return None;
    };

    let response = match request.method.as_str() {
        "initialize" => success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "relay-mcp", "version": env!("CARGO_PKG_VERSION") },
            }),
        ),
        "ping" => success(id, json!({})),
        "tools/list" => success(id, json!({ "tools": tools::definitions() })),
        "tools/call" => match request.params.get("name").and_then(Value::as_str) {
            Some(name) => {
                let args = request.params.get("arguments").cloned().unwrap_or(Value::Null);
                tracing::info!("Tool call: {}", name);
                let output = tools::call(api, name, &args).await;
                success(id, output.to_json())
            }
            None => error(id, INVALID_PARAMS, "missing tool name"),
        },
        other => error(id, METHOD_NOT_FOUND, &format!("method not found: {other}")),
    };
    Some(response)
}

/// Any value that is present, `null` included, becomes `Some`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn success(id: Value, result: Value) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "result": result })
}

fn error(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

//! HTTP control API.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use relay_core::{Relay, RelayError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

type AppState = Arc<Relay>;

pub fn router(relay: Arc<Relay>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/logs", get(logs))
        .route("/command", post(command))
        .with_state(relay)
}

pub async fn serve(listener: TcpListener, relay: Arc<Relay>) -> anyhow::Result<()> {
    axum::serve(listener, router(relay)).await?;
    Ok(())
}

/// Errors reported to HTTP callers as `400 {"error": ...}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    MalformedRequest(String),
    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedRequest(format!(
            "missing 'command' string in body: {}",
            rejection.body_text()
        ))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::MalformedRequest(format!("invalid query: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(rename = "ueConnected")]
    pub ue_connected: bool,
}

/// GET /health - liveness plus engine connection state
async fn health(State(relay): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        ue_connected: relay.is_connected(),
    })
}

#[derive(Debug, Deserialize)]
struct LogsQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<String>,
}

/// GET /logs - buffered engine log lines, oldest first
async fn logs(
    State(relay): State<AppState>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<LogsResponse>, ApiError> {
    let Query(query) = query?;
    Ok(Json(LogsResponse {
        logs: relay.logs(query.limit),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    pub message: String,
}

/// POST /command - forward a command to the engine
async fn command(
    State(relay): State<AppState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, ApiError> {
    let Json(req) = payload?;
    if req.command.trim().is_empty() {
        return Err(ApiError::MalformedRequest(
            "missing 'command' string in body: command is empty".to_string(),
        ));
    }

    relay.dispatch(&req.command, req.id).inspect_err(|e| {
        tracing::warn!("Command '{}' rejected: {}", req.command, e);
    })?;

    Ok(Json(CommandResponse {
        success: true,
        message: "sent".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{connect, start, wait_for};
    use axum::body::Body;
    use axum::http::{header, Request};
    use futures_util::{SinkExt, StreamExt};
    use relay_core::{Diagnostic, MemorySink};
    use serde::de::DeserializeOwned;
    use tokio_tungstenite::tungstenite::Message;
    use tower::ServiceExt;

    async fn call<T: DeserializeOwned>(app: Router, req: Request<Body>) -> (StatusCode, T) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn relay() -> Arc<Relay> {
        Arc::new(Relay::with_sink(100, Arc::new(MemorySink::new())))
    }

    #[tokio::test]
    async fn health_reports_disconnected() {
        let (status, body): (_, serde_json::Value) = call(router(relay()), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"status": "ok", "ueConnected": false}));
    }

    #[tokio::test]
    async fn command_without_engine_is_rejected() {
        let relay = relay();
        let (status, body): (_, ErrorResponse) = call(
            router(relay.clone()),
            post_json("/command", r#"{"command":"pie.play"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "engine not connected");
        assert!(relay.logs(None).is_empty());
    }

    #[tokio::test]
    async fn malformed_bodies_are_rejected() {
        for body in [r#"{"command":42}"#, r#"{"id":"1"}"#, "not json", r#"{"command":"  "}"#] {
            let (status, resp): (_, ErrorResponse) =
                call(router(relay()), post_json("/command", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert!(resp.error.starts_with("missing 'command' string"), "{}", resp.error);
        }
    }

    #[tokio::test]
    async fn logs_honours_limit() {
        let relay = relay();
        for i in 0..5 {
            relay.log_buffer().append(format!("line {i}"));
        }
        let (_, body): (_, LogsResponse) = call(router(relay.clone()), get("/logs")).await;
        assert_eq!(body.logs.len(), 5);
        let (_, body): (_, LogsResponse) = call(router(relay), get("/logs?limit=2")).await;
        assert_eq!(body.logs, vec!["line 3", "line 4"]);
    }

    #[tokio::test]
    async fn bad_logs_limit_is_a_json_error() {
        let (status, body): (_, ErrorResponse) =
            call(router(relay()), get("/logs?limit=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.starts_with("invalid query"), "{}", body.error);
    }

    #[tokio::test]
    async fn end_to_end_with_fake_engine() {
        let sink = Arc::new(MemorySink::new());
        let relay = Arc::new(Relay::with_sink(100, sink.clone()));
        let addr = start(relay.clone()).await;

        let mut engine = connect(addr).await;
        wait_for(|| relay.is_connected()).await;

        let (_, health): (_, HealthResponse) = call(router(relay.clone()), get("/health")).await;
        assert!(health.ue_connected);

        let (status, body): (_, CommandResponse) = call(
            router(relay.clone()),
            post_json("/command", r#"{"command":"pie.status","id":"7"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.success);
        assert_eq!(body.message, "sent");

        let frame = match engine.next().await {
            Some(Ok(Message::Text(text))) => text.as_str().to_owned(),
            other => panic!("unexpected frame: {other:?}"),
        };
        let frame: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            frame,
            serde_json::json!({"type": "command", "payload": {"command": "pie.status", "id": "7"}})
        );

        let response =
            r#"{"type":"response","command":"pie.status","success":true,"message":"Playing"}"#;
        engine
            .send(Message::Text(response.to_string().into()))
            .await
            .unwrap();
        wait_for(|| !sink.entries().is_empty()).await;

        let (_, logs): (_, LogsResponse) = call(router(relay.clone()), get("/logs")).await;
        assert!(logs.logs.is_empty());
        assert_eq!(
            sink.entries(),
            vec![Diagnostic::Response {
                command: "pie.status".into(),
                success: true,
                message: Some("Playing".into()),
            }]
        );
    }
}

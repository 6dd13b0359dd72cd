//! HTTP client for the relay's control API.

use serde::Deserialize;
use std::future::Future;

/// Body of `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Health {
    #[serde(rename = "ueConnected", default)]
    pub ue_connected: bool,
}

/// Body of a successful `POST /command`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommandAck {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LogsBody {
    logs: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("relay unreachable: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Rejected(String),
}

/// The operations the tools need from the relay.
pub trait ControlApi {
    fn health(&self) -> impl Future<Output = Result<Health, ClientError>>;
    fn send_command(&self, command: &str) -> impl Future<Output = Result<CommandAck, ClientError>>;
    fn logs(&self) -> impl Future<Output = Result<Vec<String>, ClientError>>;
}

/// [`ControlApi`] over HTTP.
pub struct HttpControl {
    base: String,
    http: reqwest::Client,
}

impl HttpControl {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

/// Decode a success body, or turn `{"error": ...}` into [`ClientError::Rejected`].
async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => format!("relay returned {status}"),
    };
    Err(ClientError::Rejected(message))
}

impl ControlApi for HttpControl {
    async fn health(&self) -> Result<Health, ClientError> {
        decode(self.http.get(self.url("/health")).send().await?).await
    }

    async fn send_command(&self, command: &str) -> Result<CommandAck, ClientError> {
        let resp = self
            .http
            .post(self.url("/command"))
            .json(&serde_json::json!({ "command": command }))
            .send()
            .await?;
        decode(resp).await
    }

    async fn logs(&self) -> Result<Vec<String>, ClientError> {
        let body: LogsBody = decode(self.http.get(self.url("/logs")).send().await?).await?;
        Ok(body.logs)
    }
}

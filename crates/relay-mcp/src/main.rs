//! Tool-invocation server for the engine relay.
//!
//! Speaks MCP (JSON-RPC 2.0, one message per line) on stdin/stdout and turns
//! each tool call into a request against the relay daemon's HTTP API.
//!
//!   cargo run -p relay-mcp -- --api-url http://localhost:4000

mod client;
mod rpc;
mod tools;

use clap::Parser;
use client::HttpControl;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "relay-mcp", version, about = "MCP tools for the engine relay")]
struct Cli {
    /// Base URL of the relay's control API
    #[arg(long, env = "RELAY_API_URL", default_value = "http://localhost:4000")]
    api_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("relay_mcp=info".parse()?))
        .init();

    let cli = Cli::parse();
    tracing::info!("Serving tools for relay at {}", cli.api_url);
    let api = HttpControl::new(cli.api_url);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(response) = rpc::handle_line(&api, &line).await {
            let mut out = serde_json::to_vec(&response)?;
            out.push(b'\n');
            stdout.write_all(&out).await?;
            stdout.flush().await?;
        }
    }

    tracing::info!("stdin closed; exiting");
    Ok(())
}

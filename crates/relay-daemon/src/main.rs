//! Engine relay daemon.
//!
//! The engine connects over WebSocket; callers drive it through the HTTP API
//! or the interactive console:
//!
//!   cargo run -p relay-daemon -- --ws-port 8081 --api-port 4000
//!
//! Then:
//!   curl localhost:4000/health
//!   curl -X POST localhost:4000/command -H 'content-type: application/json' -d '{"command":"pie.play"}'
//!   curl localhost:4000/logs

mod api;
mod config;
mod console;
mod engine;

use clap::Parser;
use config::{Cli, Config};
use console::ConsoleExit;
use relay_core::Relay;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("relay_daemon=info".parse()?)
                .add_directive("engine=info".parse()?),
        )
        .init();

    let config = Config::resolve(Cli::parse())?;
    let relay = Arc::new(Relay::new(config.log_capacity));

    let ws_listener = TcpListener::bind(config.ws_addr()).await?;
    let api_listener = TcpListener::bind(config.api_addr()).await?;
    tracing::info!("WebSocket server listening on ws://{}", ws_listener.local_addr()?);
    tracing::info!("Control API listening on http://{}", api_listener.local_addr()?);

    let engine = tokio::spawn(engine::serve(ws_listener, relay.clone()));
    let api = tokio::spawn(api::serve(api_listener, relay.clone()));

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            tracing::info!("Interrupted");
        }
        res = run_console(config.console, relay.clone()) => res?,
        res = engine => res??,
        res = api => res??,
    }

    relay.shutdown();
    Ok(())
}

/// Run the console if enabled. Only returns when the user quits.
async fn run_console(enabled: bool, relay: Arc<Relay>) -> anyhow::Result<()> {
    if enabled {
        let lines = console::stdin_lines()?;
        match console::run(relay, lines, tokio::io::stdout()).await? {
            ConsoleExit::Quit => return Ok(()),
            ConsoleExit::Eof => tracing::info!("stdin closed; console disabled"),
        }
    }
    std::future::pending().await
}

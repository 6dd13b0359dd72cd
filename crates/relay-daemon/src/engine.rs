//! WebSocket listener the engine connects to.

use futures_util::{SinkExt, StreamExt};
use relay_core::{ConnectionHandle, Outbound, Relay};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

/// Accept engine connections forever.
pub async fn serve(listener: TcpListener, relay: Arc<Relay>) -> anyhow::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let relay = relay.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, relay).await {
                tracing::warn!("Engine connection error from {}: {}", addr, e);
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    relay: Arc<Relay>,
) -> anyhow::Result<()> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut stream) = ws.split();

    let (handle, mut outbound) = ConnectionHandle::new(addr.to_string());
    let id = handle.id();
    relay.attach(handle);
    tracing::info!("Engine connected from {} (connection {})", addr, id);

    let result: anyhow::Result<()> = loop {
        tokio::select! {
            // Frame from the engine
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        relay.classify(text.as_str().as_bytes());
                    }
                    Some(Ok(Message::Binary(data))) => {
                        relay.classify(&data);
                    }
                    Some(Ok(Message::Close(_))) => {
                        // Flush the close reply queued by the handshake.
                        let _ = sink.close().await;
                        break Ok(());
                    }
                    None => break Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break Err(e.into()),
                }
            }

            // Command queued by a caller, or a request to close
            out = outbound.recv() => {
                match out {
                    Some(Outbound::Frame(frame)) => {
                        if let Err(e) = sink.send(Message::Text(frame.into())).await {
                            break Err(e.into());
                        }
                    }
                    Some(Outbound::Close) => {
                        tracing::info!("Closing engine connection {} from {}", id, addr);
                        let _ = sink.send(Message::Close(None)).await;
                        break Ok(());
                    }
                    None => break Ok(()),
                }
            }
        }
    };

    // Refuse new frames before leaving the registry so late dispatches fail
    // instead of vanishing into a dead queue.
    outbound.close();
    if relay.detach(id) {
        tracing::info!("Engine disconnected ({})", addr);
    } else {
        tracing::debug!("Superseded engine connection {} ended", id);
    }

    result
}

//! Interactive line console on stdin.
//!
//! A few words are handled locally; anything else is sent to the engine
//! verbatim. Stdin is read on its own thread so a pending read never holds
//! up runtime shutdown.

use relay_core::Relay;
use std::io::BufRead;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

const PROMPT: &str = "relay> ";
const DEFAULT_LOG_LINES: usize = 20;

const HELP: &str = "\
commands:
  play          start PIE (pie.play)
  stop          stop PIE (pie.stop)
  status        query PIE status (pie.status)
  clients       number of connected engines
  logs [N]      last N engine log lines (default 20)
  help          this text
  exit, quit    shut the relay down
anything else is sent to the engine as a console command
";

/// What a console line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    /// Blank line.
    Skip,
    Clients,
    Help,
    Quit,
    Logs(usize),
    /// Send this command to the engine.
    Forward(String),
}

/// Why the console stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    Quit,
    Eof,
}

pub fn parse_line(line: &str) -> ConsoleAction {
    let line = line.trim();
    match line {
        "" => ConsoleAction::Skip,
        "clients" => ConsoleAction::Clients,
        "help" => ConsoleAction::Help,
        "exit" | "quit" => ConsoleAction::Quit,
        "play" => ConsoleAction::Forward("pie.play".to_string()),
        "stop" => ConsoleAction::Forward("pie.stop".to_string()),
        "status" => ConsoleAction::Forward("pie.status".to_string()),
        "logs" => ConsoleAction::Logs(DEFAULT_LOG_LINES),
        _ => match line.strip_prefix("logs ").map(|n| n.trim().parse()) {
            Some(Ok(n)) => ConsoleAction::Logs(n),
            _ => ConsoleAction::Forward(line.to_string()),
        },
    }
}

/// Spawn a thread feeding stdin lines into a channel.
///
/// The channel closes at end of input or on a read error. The thread is
/// detached and dies with the process.
pub fn stdin_lines() -> std::io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("console-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("stdin read failed: {}", e);
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

/// Handle lines from `input` until `quit` or until the channel closes.
pub async fn run<W>(
    relay: Arc<Relay>,
    mut input: mpsc::Receiver<String>,
    mut output: W,
) -> anyhow::Result<ConsoleExit>
where
    W: AsyncWrite + Unpin,
{
    loop {
        output.write_all(PROMPT.as_bytes()).await?;
        output.flush().await?;

        let Some(line) = input.recv().await else {
            return Ok(ConsoleExit::Eof);
        };

        let reply = match parse_line(&line) {
            ConsoleAction::Skip => continue,
            ConsoleAction::Quit => {
                output.write_all(b"Exiting relay...\n").await?;
                output.flush().await?;
                return Ok(ConsoleExit::Quit);
            }
            ConsoleAction::Help => HELP.to_string(),
            ConsoleAction::Clients => {
                format!("Connected clients: {}\n", usize::from(relay.is_connected()))
            }
            ConsoleAction::Logs(n) => {
                let logs = relay.logs(Some(n));
                if logs.is_empty() {
                    "No logs\n".to_string()
                } else {
                    logs.join("\n") + "\n"
                }
            }
            ConsoleAction::Forward(command) => match relay.dispatch(&command, None) {
                Ok(_) => format!("Sent: {command}\n"),
                Err(e) => format!("error: {e}\n"),
            },
        };
        output.write_all(reply.as_bytes()).await?;
    }
}

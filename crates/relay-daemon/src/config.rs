//! Daemon configuration: flags and env vars over an optional TOML file over
//! built-in defaults.

use clap::Parser;
use relay_core::DEFAULT_LOG_CAPACITY;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_WS_PORT: u16 = 8081;
pub const DEFAULT_API_PORT: u16 = 4000;

#[derive(Debug, Default, Parser)]
#[command(
    name = "relay-daemon",
    version,
    about = "Relay commands between HTTP/console callers and a connected engine"
)]
pub struct Cli {
    /// TOML config file
    #[arg(short, long, env = "RELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind both listeners on
    #[arg(long, env = "RELAY_HOST")]
    pub host: Option<IpAddr>,

    /// Port the engine connects to over WebSocket
    #[arg(long, env = "RELAY_WS_PORT")]
    pub ws_port: Option<u16>,

    /// Port of the HTTP control API
    #[arg(long, env = "RELAY_API_PORT")]
    pub api_port: Option<u16>,

    /// Number of engine log lines kept in memory
    #[arg(long, env = "RELAY_LOG_CAPACITY")]
    pub log_capacity: Option<usize>,

    /// Run without the interactive console
    #[arg(long, default_value_t = false)]
    pub no_console: bool,
}

/// Keys accepted in the config file. All optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<IpAddr>,
    pub ws_port: Option<u16>,
    pub api_port: Option<u16>,
    pub log_capacity: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub ws_port: u16,
    pub api_port: u16,
    pub log_capacity: usize,
    pub console: bool,
}

impl Config {
    pub fn resolve(cli: Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    fn merge(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let log_capacity = cli
            .log_capacity
            .or(file.log_capacity)
            .unwrap_or(DEFAULT_LOG_CAPACITY);
        if log_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        Ok(Self {
            host: cli.host.or(file.host).unwrap_or(DEFAULT_HOST),
            ws_port: cli.ws_port.or(file.ws_port).unwrap_or(DEFAULT_WS_PORT),
            api_port: cli.api_port.or(file.api_port).unwrap_or(DEFAULT_API_PORT),
            log_capacity,
            console: !cli.no_console,
        })
    }

    pub fn ws_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.ws_port)
    }

    pub fn api_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.api_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("log capacity must be at least 1")]
    ZeroCapacity,
}

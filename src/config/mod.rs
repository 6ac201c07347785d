//! Bot configuration, loaded from TOML.
//!
//! ```toml
//! command_prefix = "!"
//!
//! [[servers]]
//! name = "libera"
//! host = "irc.libera.chat"
//! port = 6697
//! nick = "slircbot"
//! tls = true
//! admins = ["alice"]
//! channels = ["#slirc"]
//!
//! [[command_plugins]]
//! scope = "both"
//! plugin = "version"
//! commands = ["version", "v"]
//! ```

mod defaults;

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::bot::Scope;
use crate::client::ClientOptions;
use crate::state::Server;

use self::defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Marks a chat line as a bot command.
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Reply to CTCP VERSION and the `version` command.
    #[serde(default = "default_version")]
    pub version: String,
    /// Log at debug unless `RUST_LOG` says otherwise.
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    #[serde(default = "default_connect_retry_secs")]
    pub connect_retry_secs: u64,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Sent when the bot is stopped.
    #[serde(default = "default_quit_message")]
    pub quit_message: String,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
    #[serde(default)]
    pub event_plugins: Vec<EventPluginConfig>,
    #[serde(default)]
    pub command_plugins: Vec<CommandPluginConfig>,
}

/// One `[[servers]]` block.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Defaults to the host.
    pub name: Option<String>,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub nick: String,
    #[serde(default)]
    pub tls: bool,
    #[serde(default)]
    pub admins: Vec<String>,
    #[serde(default)]
    pub channels: Vec<String>,
}

/// Event plugins registered for one event kind, in order.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPluginConfig {
    /// Event name as logged: `JOIN`, `PUBMSG`, `UMODE`, `001`, ...
    pub event: String,
    pub plugins: Vec<String>,
}

/// One command route.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandPluginConfig {
    #[serde(default)]
    pub scope: Scope,
    pub plugin: String,
    pub commands: Vec<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Server records for the client. Admin nicks are kept as written and
    /// matched exactly.
    pub fn servers(&self) -> Vec<Server> {
        self.servers
            .iter()
            .map(|s| {
                let server = Server::new(&s.host, s.port, &s.nick, s.tls)
                    .with_admins(s.admins.clone())
                    .with_channels(s.channels.clone());
                match &s.name {
                    Some(name) => server.with_name(name),
                    None => server,
                }
            })
            .collect()
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            version: self.version.clone(),
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
            connect_attempts: self.connect_attempts,
            connect_retry: Duration::from_secs(self.connect_retry_secs),
            max_workers: self.max_workers,
            ..ClientOptions::default()
        }
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

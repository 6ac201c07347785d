//! Error types for the IRC client engine.
//!
//! Transport failures are recovered locally by the connection layer (they
//! turn into a disconnect), so most of these surface only to callers that
//! explicitly ask for a result, such as [`Connection::send`].
//!
//! [`Connection::send`]: crate::connection::Connection::send

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Low-level protocol and transport errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A received line was not valid UTF-8.
    #[error("decode error: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// The connection has no open socket.
    #[error("not connected")]
    NotConnected,

    /// TLS was requested for a server but this build has no TLS support.
    #[error("TLS requested for {host} but TLS support is not compiled in")]
    TlsUnavailable {
        /// Host the secure connection was requested for.
        host: String,
    },

    /// The host name cannot be used as a TLS server name.
    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),
}

/// Errors surfaced by the [`Client`](crate::client::Client) façade.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// A connection could not be constructed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A command plugin named in the configuration is not in the catalog.
    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),

    /// An event kind named in the configuration is not recognised.
    #[error("unknown event kind: {0}")]
    UnknownEvent(String),
}

//! # slirc-client
//!
//! An event-driven IRC client engine. It keeps connections to one or more
//! servers, turns raw protocol lines into structured [`Event`]s, tracks
//! channel membership and modes, and hands everything else to registered
//! handlers.
//!
//! ## Layers
//!
//! - [`line`] parses one protocol line into an [`Event`]; [`encode`] formats
//!   outbound commands.
//! - [`mode`] decodes compound mode strings such as `+o-v alice bob`.
//! - [`connection`] owns sockets, buffers partial lines and multiplexes
//!   readiness across every live connection.
//! - [`state`] holds servers, channels and users, updated by the client's
//!   own protocol handlers.
//! - [`dispatch`] routes events to core handlers and then to plugins.
//! - [`client`] wires it together and exposes outbound actions.
//! - [`bot`] is a small application layer: prefix-triggered command plugins.
//!
//! ## Quick Start
//!
//! ```no_run
//! use slirc_client::client::{Client, ClientOptions};
//! use slirc_client::state::Server;
//!
//! # async fn run() -> Result<(), slirc_client::error::ClientError> {
//! let server = Server::new("irc.libera.chat", 6697, "slircbot", true)
//!     .with_channels(vec!["#slirc".to_string()]);
//! let client = Client::new(vec![server], ClientOptions::default())?;
//! let restart = client.start().await;
//! # let _ = restart;
//! # Ok(())
//! # }
//! ```
//!
//! ## Parsing a line
//!
//! ```rust
//! use slirc_client::event::EventKind;
//! use slirc_client::line::parse;
//! use slirc_client::state::Server;
//!
//! let server = Server::new("irc.example.net", 6667, "bot", false);
//! let event = parse(&server, ":alice!a@host PRIVMSG #rust :hello");
//! assert_eq!(event.kind, EventKind::Pubmsg);
//! assert_eq!(event.message.as_deref(), Some("hello"));
//! ```

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bot;
pub mod casemap;
pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod encode;
pub mod error;
pub mod event;
pub mod line;
pub mod mode;
pub mod response;
pub mod state;

pub use self::casemap::{irc_eq, irc_to_lower, is_channel_name};
pub use self::client::{Client, ClientOptions};
pub use self::connection::{Connection, ConnectionManager, ConnectionState};
pub use self::dispatch::{Dispatch, EventHandler, HandlerContext};
pub use self::encode::Outbound;
pub use self::error::{ClientError, ProtocolError};
pub use self::event::{Event, EventArgs, EventKind, Interest, Source, Target};
pub use self::mode::Mode;
pub use self::response::Response;
pub use self::state::{Channel, Server, Session, Status, User};

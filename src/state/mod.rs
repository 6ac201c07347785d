//! Session state: servers, channels, users.
//!
//! Only the client's own protocol handlers mutate this state; plugins read
//! it through the [`Client`](crate::client::Client) query methods.

mod channel;
mod server;
mod session;
mod user;

pub use self::channel::Channel;
pub use self::server::Server;
pub use self::session::Session;
pub use self::user::{Status, User};

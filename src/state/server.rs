//! Per-server configuration and learned identity.

use std::fmt;

use parking_lot::RwLock;

/// A configured IRC server.
///
/// The static half (host, port, admins, channels to join) comes from
/// configuration. The learned half is filled in as the connection runs:
/// `actual_host` from the first three-token line the server sends, and
/// `actual_nick` from the welcome reply.
#[derive(Debug)]
pub struct Server {
    name: String,
    host: String,
    port: u16,
    tls: bool,
    admins: Vec<String>,
    channels: Vec<String>,
    nick: RwLock<String>,
    actual_host: RwLock<Option<String>>,
    actual_nick: RwLock<Option<String>>,
}

impl Server {
    /// Create a server record. Its name defaults to the host.
    pub fn new(host: &str, port: u16, nick: &str, tls: bool) -> Self {
        Self {
            name: host.to_string(),
            host: host.to_string(),
            port,
            tls,
            admins: Vec::new(),
            channels: Vec::new(),
            nick: RwLock::new(nick.to_string()),
            actual_host: RwLock::new(None),
            actual_nick: RwLock::new(None),
        }
    }

    /// Set a display name, used by [`Client::server_by_name`].
    ///
    /// [`Client::server_by_name`]: crate::client::Client::server_by_name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Nicks allowed to run admin commands on this server.
    pub fn with_admins(mut self, admins: Vec<String>) -> Self {
        self.admins = admins;
        self
    }

    /// Channels joined once the server welcomes us.
    pub fn with_channels(mut self, channels: Vec<String>) -> Self {
        self.channels = channels;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn use_tls(&self) -> bool {
        self.tls
    }

    pub fn admins(&self) -> &[String] {
        &self.admins
    }

    /// Channels to join after the welcome reply.
    pub fn initial_channels(&self) -> &[String] {
        &self.channels
    }

    /// The nick we are asking for. Grows a `_` on every nick collision.
    pub fn nick(&self) -> String {
        self.nick.read().clone()
    }

    pub fn set_nick(&self, nick: &str) {
        *self.nick.write() = nick.to_string();
    }

    /// Host name the server announces itself with, once learned.
    pub fn actual_host(&self) -> Option<String> {
        self.actual_host.read().clone()
    }

    /// Record `host` as the server's own name unless one is already known.
    /// Returns true if it was recorded.
    pub fn learn_host(&self, host: &str) -> bool {
        let mut slot = self.actual_host.write();
        if slot.is_some() || host.is_empty() {
            return false;
        }
        *slot = Some(host.to_string());
        true
    }

    /// Nick the server confirmed in its welcome reply.
    pub fn actual_nick(&self) -> Option<String> {
        self.actual_nick.read().clone()
    }

    pub fn set_actual_nick(&self, nick: &str) {
        *self.actual_nick.write() = Some(nick.to_string());
    }

    /// Is `nick` (compared exactly, without case folding) an admin here?
    pub fn is_admin(&self, nick: &str) -> bool {
        self.admins.iter().any(|admin| admin == nick)
    }

    /// Forget what was learned from a previous connection.
    pub fn reset(&self) {
        *self.actual_host.write() = None;
        *self.actual_nick.write() = None;
    }

    /// `host:port`, suitable for `TcpStream::connect`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Servers compare by what they told us about themselves, plus the port.
impl PartialEq for Server {
    fn eq(&self, other: &Self) -> bool {
        self.port == other.port
            && *self.actual_host.read() == *other.actual_host.read()
            && *self.actual_nick.read() == *other.actual_nick.read()
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learn_host_once() {
        let server = Server::new("irc.example.net", 6667, "bot", false);
        assert_eq!(server.actual_host(), None);
        assert!(server.learn_host("hub.example.net"));
        assert!(!server.learn_host("leaf.example.net"));
        assert_eq!(server.actual_host().as_deref(), Some("hub.example.net"));

        server.reset();
        assert_eq!(server.actual_host(), None);
    }

    #[test]
    fn test_is_admin_is_exact() {
        let server =
            Server::new("irc.example.net", 6667, "bot", false).with_admins(vec!["Alice".into()]);
        assert!(server.is_admin("Alice"));
        assert!(!server.is_admin("alice"));
    }

    #[test]
    fn test_equality_uses_learned_identity() {
        let a = Server::new("a.example.net", 6667, "bot", false);
        let b = Server::new("b.example.net", 6667, "bot", false);
        assert_eq!(a, b);

        a.set_actual_nick("bot");
        assert_ne!(a, b);
        b.set_actual_nick("bot");
        assert_eq!(a, b);

        let c = Server::new("a.example.net", 6697, "bot", false);
        c.set_actual_nick("bot");
        assert_ne!(a, c);
    }
}

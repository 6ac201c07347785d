//! The set of channels the client currently sits in.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::casemap::irc_to_lower;
use crate::state::{Channel, Server};

/// Channel records across all servers.
///
/// Channels are keyed by the owning server's identity (the `Arc` it was
/// created from) and the folded channel name, so two servers can both have
/// a `#rust` without colliding.
#[derive(Debug, Default)]
pub struct Session {
    channels: RwLock<Vec<Arc<Channel>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the channel record for `name`, creating it if needed.
    pub fn add_channel(&self, server: &Arc<Server>, name: &str) -> Arc<Channel> {
        let key = irc_to_lower(name);
        let mut channels = self.channels.write();
        if let Some(existing) = channels
            .iter()
            .find(|c| Arc::ptr_eq(c.server(), server) && c.name() == key)
        {
            return Arc::clone(existing);
        }
        let channel = Arc::new(Channel::new(Arc::clone(server), name));
        channels.push(Arc::clone(&channel));
        channel
    }

    pub fn find_channel(&self, server: &Arc<Server>, name: &str) -> Option<Arc<Channel>> {
        let key = irc_to_lower(name);
        self.channels
            .read()
            .iter()
            .find(|c| Arc::ptr_eq(c.server(), server) && c.name() == key)
            .cloned()
    }

    pub fn remove_channel(&self, server: &Arc<Server>, name: &str) -> bool {
        let key = irc_to_lower(name);
        let mut channels = self.channels.write();
        let before = channels.len();
        channels.retain(|c| !(Arc::ptr_eq(c.server(), server) && c.name() == key));
        channels.len() != before
    }

    /// All channels on `server`.
    pub fn server_channels(&self, server: &Arc<Server>) -> Vec<Arc<Channel>> {
        self.channels
            .read()
            .iter()
            .filter(|c| Arc::ptr_eq(c.server(), server))
            .cloned()
            .collect()
    }

    /// Drop every channel belonging to `server`.
    pub fn clear_server(&self, server: &Arc<Server>) {
        self.channels
            .write()
            .retain(|c| !Arc::ptr_eq(c.server(), server));
    }

    pub fn channels(&self) -> Vec<Arc<Channel>> {
        self.channels.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(host: &str) -> Arc<Server> {
        Arc::new(Server::new(host, 6667, "bot", false))
    }

    #[test]
    fn test_add_is_idempotent() {
        let session = Session::new();
        let libera = server("irc.libera.chat");
        let a = session.add_channel(&libera, "#Rust");
        let b = session.add_channel(&libera, "#rust");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(session.channels().len(), 1);
    }

    #[test]
    fn test_channels_are_scoped_by_server() {
        let session = Session::new();
        let libera = server("irc.libera.chat");
        let oftc = server("irc.oftc.net");
        session.add_channel(&libera, "#rust");
        session.add_channel(&oftc, "#rust");

        assert_eq!(session.server_channels(&libera).len(), 1);
        assert!(session.remove_channel(&oftc, "#RUST"));
        assert!(session.find_channel(&oftc, "#rust").is_none());
        assert!(session.find_channel(&libera, "#rust").is_some());

        session.clear_server(&libera);
        assert!(session.channels().is_empty());
    }
}

//! Registration handshake.
//!
//! Pure state transitions on a [`Server`]: each step returns the actions to
//! perform and touches no socket, so the sequencing is testable without a
//! network.

use crate::encode::Outbound;
use crate::state::Server;

/// What the caller should do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Send this command to the server.
    Send(Outbound),
    /// The server accepted us under this nick.
    Complete { nick: String },
}

/// Handshake steps for one server.
#[derive(Clone, Copy, Debug)]
pub struct Registration<'a> {
    server: &'a Server,
}

impl<'a> Registration<'a> {
    pub fn new(server: &'a Server) -> Self {
        Self { server }
    }

    /// NICK and USER with the currently desired nick.
    #[must_use]
    pub fn start(&self) -> Vec<HandshakeAction> {
        let nick = self.server.nick();
        vec![
            HandshakeAction::Send(Outbound::Nick(nick.clone())),
            HandshakeAction::Send(Outbound::user(&nick)),
        ]
    }

    /// The nick was taken: append `_` and register again.
    #[must_use]
    pub fn nickname_in_use(&self) -> Vec<HandshakeAction> {
        let nick = format!("{}_", self.server.nick());
        self.server.set_nick(&nick);
        self.start()
    }

    /// Welcome received: record the confirmed nick and join the
    /// configured channels.
    #[must_use]
    pub fn welcome(&self, confirmed: &str) -> Vec<HandshakeAction> {
        self.server.set_actual_nick(confirmed);
        let mut actions = vec![HandshakeAction::Complete {
            nick: confirmed.to_string(),
        }];
        let channels = self.server.initial_channels();
        if !channels.is_empty() {
            actions.push(HandshakeAction::Send(Outbound::join(channels)));
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sent(actions: &[HandshakeAction]) -> Vec<String> {
        actions
            .iter()
            .filter_map(|a| match a {
                HandshakeAction::Send(cmd) => Some(cmd.to_string()),
                HandshakeAction::Complete { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_start() {
        let server = Server::new("irc.example.net", 6667, "bot", false);
        let actions = Registration::new(&server).start();
        assert_eq!(sent(&actions), vec!["NICK bot", "USER bot 0 * :bot"]);
    }

    #[test]
    fn test_collisions_keep_growing() {
        let server = Server::new("irc.example.net", 6667, "bot", false);
        let reg = Registration::new(&server);
        assert_eq!(sent(&reg.nickname_in_use()), vec!["NICK bot_", "USER bot_ 0 * :bot_"]);
        assert_eq!(sent(&reg.nickname_in_use())[0], "NICK bot__");
        assert_eq!(server.nick(), "bot__");
    }

    #[test]
    fn test_welcome_joins_channels() {
        let server = Server::new("irc.example.net", 6667, "bot", false)
            .with_channels(vec!["#a".into(), "#b".into()]);
        let actions = Registration::new(&server).welcome("bot_");
        assert_eq!(
            actions[0],
            HandshakeAction::Complete {
                nick: "bot_".into()
            }
        );
        assert_eq!(sent(&actions), vec!["JOIN #a,#b"]);
        assert_eq!(server.actual_nick().as_deref(), Some("bot_"));
    }

    #[test]
    fn test_welcome_without_channels() {
        let server = Server::new("irc.example.net", 6667, "bot", false);
        assert!(sent(&Registration::new(&server).welcome("bot")).is_empty());
    }
}

//! The client's own protocol handlers.
//!
//! These keep session state in step with the server and answer the
//! protocol-level requests (PING, CTCP) no plugin should have to care about.
//! Each runs before any plugin registered for the same event kind.

use std::sync::Arc;

use chrono::Local;
use tracing::{debug, error, info, warn};

use super::ctcp;
use super::registration::{HandshakeAction, Registration};
use super::Client;
use crate::casemap::irc_eq;
use crate::connection::Connection;
use crate::encode::Outbound;
use crate::event::{EventArgs, EventKind, Interest};
use crate::mode::decode;
use crate::response::Response;
use crate::state::{Server, User};

/// Whether plugins still get the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Consumed,
}

/// A built-in handler, one per event kind at most.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreHook {
    Connect,
    Welcome,
    NicknameInUse,
    Ping,
    Mode,
    UserMode,
    Join,
    Part,
    Quit,
    Kick,
    Nick,
    NameReply,
    ChannelModeIs,
    Privmsg,
    Error,
}

impl CoreHook {
    pub fn for_kind(kind: &EventKind) -> Option<CoreHook> {
        let hook = match kind {
            EventKind::Connect => CoreHook::Connect,
            EventKind::Numeric(Response::RPL_WELCOME) => CoreHook::Welcome,
            EventKind::Numeric(Response::ERR_NICKNAMEINUSE) => CoreHook::NicknameInUse,
            EventKind::Numeric(Response::RPL_NAMREPLY) => CoreHook::NameReply,
            EventKind::Numeric(Response::RPL_CHANNELMODEIS) => CoreHook::ChannelModeIs,
            EventKind::Ping => CoreHook::Ping,
            EventKind::Mode => CoreHook::Mode,
            EventKind::UserMode => CoreHook::UserMode,
            EventKind::Join => CoreHook::Join,
            EventKind::Part => CoreHook::Part,
            EventKind::Quit => CoreHook::Quit,
            EventKind::Kick => CoreHook::Kick,
            EventKind::Nick => CoreHook::Nick,
            EventKind::Privmsg => CoreHook::Privmsg,
            EventKind::Error => CoreHook::Error,
            _ => return None,
        };
        Some(hook)
    }

    pub fn interest(self) -> Interest {
        let none = Interest::NONE;
        match self {
            CoreHook::Connect | CoreHook::NicknameInUse => none,
            CoreHook::Welcome => none.source().target().message(),
            CoreHook::Ping | CoreHook::Error => none.message(),
            CoreHook::Mode => none.source().target().args().message(),
            CoreHook::UserMode => none.source().target().message(),
            CoreHook::Join | CoreHook::Part | CoreHook::Nick => none.source().target().message(),
            CoreHook::Quit => none.source().message(),
            CoreHook::Kick => none.source().target().args().message(),
            CoreHook::NameReply => none.source().target().args().message(),
            CoreHook::ChannelModeIs => none.source().target().args(),
            CoreHook::Privmsg => none.source().target().message(),
        }
    }
}

/// Is `nick` the nick we're using on `server`?
fn is_me(server: &Server, nick: &str) -> bool {
    match server.actual_nick() {
        Some(me) => irc_eq(&me, nick),
        None => irc_eq(&server.nick(), nick),
    }
}

/// Channel named by a JOIN/PART: trailing parameter first, then the target.
fn channel_of(args: &EventArgs) -> Option<&str> {
    args.message.as_deref().or_else(|| args.target_str())
}

impl Client {
    pub(crate) async fn run_core(
        &self,
        hook: CoreHook,
        connection: &Arc<Connection>,
        args: EventArgs,
    ) -> anyhow::Result<Flow> {
        match hook {
            CoreHook::Connect => self.on_connect(connection).await,
            CoreHook::Welcome => self.on_welcome(connection, &args).await,
            CoreHook::NicknameInUse => self.on_nickname_in_use(connection).await,
            CoreHook::Ping => self.on_ping(connection, &args).await,
            CoreHook::Mode => Ok(self.on_mode(connection, &args)),
            CoreHook::UserMode => {
                debug!(connection = %connection.id(), modes = args.message(), "user mode changed");
                Ok(Flow::Continue)
            }
            CoreHook::Join => self.on_join(connection, &args).await,
            CoreHook::Part => Ok(self.on_part(connection, &args)),
            CoreHook::Quit => Ok(self.on_quit(connection, &args)),
            CoreHook::Kick => Ok(self.on_kick(connection, &args)),
            CoreHook::Nick => Ok(self.on_nick(connection, &args)),
            CoreHook::NameReply => Ok(self.on_name_reply(connection, &args)),
            CoreHook::ChannelModeIs => Ok(self.on_channel_mode_is(connection, &args)),
            CoreHook::Privmsg => self.on_privmsg(connection, &args).await,
            CoreHook::Error => Ok(self.on_error(connection, &args)),
        }
    }

    async fn perform(
        &self,
        connection: &Connection,
        actions: Vec<HandshakeAction>,
    ) -> anyhow::Result<()> {
        for action in actions {
            match action {
                HandshakeAction::Send(command) => connection.send_command(&command).await?,
                HandshakeAction::Complete { nick } => {
                    connection.set_welcomed();
                    info!(server = %connection.server(), nick = %nick, "registered");
                }
            }
        }
        Ok(())
    }

    async fn on_connect(&self, connection: &Arc<Connection>) -> anyhow::Result<Flow> {
        let actions = Registration::new(connection.server()).start();
        self.perform(connection, actions).await?;
        Ok(Flow::Continue)
    }

    async fn on_welcome(
        &self,
        connection: &Arc<Connection>,
        args: &EventArgs,
    ) -> anyhow::Result<Flow> {
        let server = connection.server();
        let nick = args
            .target_str()
            .map(str::to_string)
            .unwrap_or_else(|| server.nick());
        let actions = Registration::new(server).welcome(&nick);
        self.perform(connection, actions).await?;
        Ok(Flow::Continue)
    }

    async fn on_nickname_in_use(&self, connection: &Arc<Connection>) -> anyhow::Result<Flow> {
        let server = connection.server();
        warn!(server = %server, nick = %server.nick(), "nickname in use");
        let actions = Registration::new(server).nickname_in_use();
        self.perform(connection, actions).await?;
        Ok(Flow::Continue)
    }

    async fn on_ping(
        &self,
        connection: &Arc<Connection>,
        args: &EventArgs,
    ) -> anyhow::Result<Flow> {
        let server = connection.server();
        let pong = Outbound::Pong {
            server: server
                .actual_host()
                .unwrap_or_else(|| server.host().to_string()),
            token: args.message().to_string(),
        };
        connection.send_command(&pong).await?;
        Ok(Flow::Consumed)
    }

    fn on_mode(&self, connection: &Arc<Connection>, args: &EventArgs) -> Flow {
        let Some(target) = args.target_str() else {
            return Flow::Continue;
        };
        let Some(channel) = self.session().find_channel(connection.server(), target) else {
            return Flow::Continue;
        };

        let trailing: Vec<String>;
        let pieces = if args.args.is_empty() {
            trailing = args.message().split_whitespace().map(str::to_string).collect();
            &trailing
        } else {
            &args.args
        };
        let Some((modes, mode_args)) = pieces.split_first() else {
            return Flow::Continue;
        };

        for op in decode(modes, mode_args) {
            if let Some(param) = op.param() {
                if channel.apply_user_mode(param, &op) {
                    continue;
                }
            }
            if op.on {
                channel.add_mode(op);
            } else {
                channel.remove_mode(&op);
            }
        }
        Flow::Continue
    }

    async fn on_join(
        &self,
        connection: &Arc<Connection>,
        args: &EventArgs,
    ) -> anyhow::Result<Flow> {
        let (Some(nick), Some(name)) = (args.source_nick(), channel_of(args)) else {
            return Ok(Flow::Continue);
        };
        let server = connection.server();

        if is_me(server, nick) {
            let channel = self.session().add_channel(server, name);
            info!(server = %server, channel = %channel, "joined");
            let query = Outbound::Mode {
                target: channel.name().to_string(),
                modes: None,
            };
            connection.send_command(&query).await?;
        } else if let Some(channel) = self.session().find_channel(server, name) {
            channel.add_user(User::member(nick));
        }
        Ok(Flow::Continue)
    }

    fn on_part(&self, connection: &Arc<Connection>, args: &EventArgs) -> Flow {
        let name = args.target_str().or(args.message.as_deref());
        let (Some(nick), Some(name)) = (args.source_nick(), name) else {
            return Flow::Continue;
        };
        let server = connection.server();

        if is_me(server, nick) {
            self.session().remove_channel(server, name);
            info!(server = %server, channel = %name, "left");
        } else if let Some(channel) = self.session().find_channel(server, name) {
            channel.remove_nick(nick);
        }
        Flow::Continue
    }

    fn on_quit(&self, connection: &Arc<Connection>, args: &EventArgs) -> Flow {
        if let Some(nick) = args.source_nick() {
            for channel in self.session().server_channels(connection.server()) {
                channel.remove_nick(nick);
            }
        }
        Flow::Continue
    }

    fn on_kick(&self, connection: &Arc<Connection>, args: &EventArgs) -> Flow {
        let (Some(name), Some(victim)) = (args.target_str(), args.args.first()) else {
            return Flow::Continue;
        };
        let server = connection.server();

        if is_me(server, victim) {
            self.session().remove_channel(server, name);
            warn!(server = %server, channel = %name, reason = args.message(), "kicked");
        } else if let Some(channel) = self.session().find_channel(server, name) {
            channel.remove_nick(victim);
        }
        Flow::Continue
    }

    fn on_nick(&self, connection: &Arc<Connection>, args: &EventArgs) -> Flow {
        let (Some(old), Some(new)) = (args.source_nick(), channel_of(args)) else {
            return Flow::Continue;
        };
        let server = connection.server();

        if is_me(server, old) {
            server.set_nick(new);
            server.set_actual_nick(new);
            info!(server = %server, nick = %new, "nick changed");
        }
        for channel in self.session().server_channels(server) {
            channel.rename_user(old, new);
        }
        Flow::Continue
    }

    fn on_name_reply(&self, connection: &Arc<Connection>, args: &EventArgs) -> Flow {
        let Some(name) = args.args.last() else {
            return Flow::Continue;
        };
        if let Some(channel) = self.session().find_channel(connection.server(), name) {
            for entry in args.message().split_whitespace() {
                channel.add_user(User::parse(entry));
            }
        }
        Flow::Continue
    }

    fn on_channel_mode_is(&self, connection: &Arc<Connection>, args: &EventArgs) -> Flow {
        let [name, modes, mode_args @ ..] = args.args.as_slice() else {
            return Flow::Continue;
        };
        if let Some(channel) = self.session().find_channel(connection.server(), name) {
            for op in decode(modes, mode_args) {
                if op.on {
                    channel.add_mode(op);
                } else {
                    channel.remove_mode(&op);
                }
            }
        }
        Flow::Continue
    }

    async fn on_privmsg(
        &self,
        connection: &Arc<Connection>,
        args: &EventArgs,
    ) -> anyhow::Result<Flow> {
        let Some(request) = ctcp::parse(args.message()) else {
            return Ok(Flow::Continue);
        };
        let Some(nick) = args.source_nick() else {
            return Ok(Flow::Consumed);
        };

        debug!(from = %nick, command = request.command, "CTCP request");
        if let Some(reply) = ctcp::reply(&request, self.version(), Local::now()) {
            self.ctcp_reply(connection, nick, request.command, &reply).await?;
        }
        Ok(Flow::Consumed)
    }

    fn on_error(&self, connection: &Arc<Connection>, args: &EventArgs) -> Flow {
        let message = args.message();
        let server = connection.server();
        if message.to_lowercase().contains("ping timeout") {
            warn!(server = %server, message = %message, "ping timeout, reconnecting");
            self.reconnect(Arc::clone(server));
        } else {
            error!(server = %server, message = %message, "server error");
        }
        Flow::Continue
    }
}

//! Structured events produced by the line codec.

use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;
use crate::response::Response;
use crate::state::User;

/// What kind of line was received.
///
/// PRIVMSG and NOTICE are split by where they were sent: to a channel
/// (`Pubmsg`, `PubNotice`) or to us (`Privmsg`, `PrivNotice`). MODE on a
/// non-channel target becomes `UserMode`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EventKind {
    /// Synthesised when a socket connects. Never parsed from the wire.
    Connect,
    Ping,
    Pong,
    Mode,
    UserMode,
    Join,
    Part,
    Quit,
    Kick,
    Nick,
    Topic,
    Invite,
    Privmsg,
    Pubmsg,
    PrivNotice,
    PubNotice,
    Error,
    /// A known three-digit reply.
    Numeric(Response),
    /// Any other command, verbatim.
    Other(String),
}

impl EventKind {
    /// Classify a command token before target-based refinement.
    pub fn from_command(command: &str) -> Self {
        match command {
            "PING" => EventKind::Ping,
            "PONG" => EventKind::Pong,
            "MODE" => EventKind::Mode,
            "JOIN" => EventKind::Join,
            "PART" => EventKind::Part,
            "QUIT" => EventKind::Quit,
            "KICK" => EventKind::Kick,
            "NICK" => EventKind::Nick,
            "TOPIC" => EventKind::Topic,
            "INVITE" => EventKind::Invite,
            "PRIVMSG" => EventKind::Privmsg,
            "NOTICE" => EventKind::PrivNotice,
            "ERROR" => EventKind::Error,
            _ => match command.parse::<Response>() {
                Ok(response) => EventKind::Numeric(response),
                Err(_) => EventKind::Other(command.to_string()),
            },
        }
    }

    /// The command token this kind travels as on the wire.
    pub fn command(&self) -> String {
        match self {
            EventKind::Connect => "CONNECT".to_string(),
            EventKind::Ping => "PING".to_string(),
            EventKind::Pong => "PONG".to_string(),
            EventKind::Mode | EventKind::UserMode => "MODE".to_string(),
            EventKind::Join => "JOIN".to_string(),
            EventKind::Part => "PART".to_string(),
            EventKind::Quit => "QUIT".to_string(),
            EventKind::Kick => "KICK".to_string(),
            EventKind::Nick => "NICK".to_string(),
            EventKind::Topic => "TOPIC".to_string(),
            EventKind::Invite => "INVITE".to_string(),
            EventKind::Privmsg | EventKind::Pubmsg => "PRIVMSG".to_string(),
            EventKind::PrivNotice | EventKind::PubNotice => "NOTICE".to_string(),
            EventKind::Error => "ERROR".to_string(),
            EventKind::Numeric(response) => response.to_string(),
            EventKind::Other(command) => command.clone(),
        }
    }

    /// Chat messages, whose plugins run on the worker pool.
    pub fn is_application_message(&self) -> bool {
        matches!(self, EventKind::Privmsg | EventKind::Pubmsg)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::UserMode => f.write_str("UMODE"),
            EventKind::Pubmsg => f.write_str("PUBMSG"),
            EventKind::PrivNotice => f.write_str("PRIVNOTICE"),
            EventKind::PubNotice => f.write_str("PUBNOTICE"),
            other => f.write_str(&other.command()),
        }
    }
}

/// Parses the names [`Display`](fmt::Display) produces: `PUBMSG`, `UMODE`,
/// `001`, and so on. Used for event names in configuration.
impl FromStr for EventKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_ascii_uppercase().as_str() {
            "CONNECT" => EventKind::Connect,
            "UMODE" => EventKind::UserMode,
            "PUBMSG" => EventKind::Pubmsg,
            "PRIVNOTICE" | "NOTICE" => EventKind::PrivNotice,
            "PUBNOTICE" => EventKind::PubNotice,
            other => match EventKind::from_command(other) {
                EventKind::Other(_) => return Err(ClientError::UnknownEvent(s.to_string())),
                kind => kind,
            },
        };
        Ok(kind)
    }
}

/// Who sent a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    /// The server itself (the prefix matched its learned host).
    Server(String),
    /// A user mask.
    User(User),
}

impl Source {
    /// Nick of a user source.
    pub fn nick(&self) -> Option<&str> {
        match self {
            Source::User(user) => Some(user.nick()),
            Source::Server(_) => None,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            Source::User(user) => Some(user),
            Source::Server(_) => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Server(host) => f.write_str(host),
            Source::User(user) => user.fmt(f),
        }
    }
}

/// Where a line was sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A channel, a nick that isn't ours, or anything else.
    Name(String),
    /// Our own confirmed nick.
    User(User),
}

impl Target {
    /// The target as text: the name, or our nick.
    pub fn as_str(&self) -> &str {
        match self {
            Target::Name(name) => name,
            Target::User(user) => user.nick(),
        }
    }

    pub fn is_channel(&self) -> bool {
        crate::casemap::is_channel_name(self.as_str())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed protocol line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub source: Option<Source>,
    pub target: Option<Target>,
    /// Middle parameters after the target.
    pub args: Vec<String>,
    /// Trailing parameter (after ` :`).
    pub message: Option<String>,
}

impl Event {
    /// An event with no fields set.
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            source: None,
            target: None,
            args: Vec::new(),
            message: None,
        }
    }

    /// Nick of the sender, if a user sent it.
    pub fn source_nick(&self) -> Option<&str> {
        self.source.as_ref().and_then(Source::nick)
    }

    pub fn target_str(&self) -> Option<&str> {
        self.target.as_ref().map(Target::as_str)
    }
}

/// Reassembles a protocol line: `[:source ]COMMAND[ target[ args...]][ :message]`.
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, ":{} ", source)?;
        }
        f.write_str(&self.kind.command())?;
        if let Some(target) = &self.target {
            write!(f, " {}", target)?;
        }
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        if let Some(message) = &self.message {
            write!(f, " :{}", message)?;
        }
        Ok(())
    }
}

/// Which event fields a handler wants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interest {
    pub source: bool,
    pub target: bool,
    pub args: bool,
    pub message: bool,
}

impl Interest {
    pub const NONE: Interest = Interest {
        source: false,
        target: false,
        args: false,
        message: false,
    };

    pub const ALL: Interest = Interest {
        source: true,
        target: true,
        args: true,
        message: true,
    };

    pub const fn source(mut self) -> Self {
        self.source = true;
        self
    }

    pub const fn target(mut self) -> Self {
        self.target = true;
        self
    }

    pub const fn args(mut self) -> Self {
        self.args = true;
        self
    }

    pub const fn message(mut self) -> Self {
        self.message = true;
        self
    }

    /// Copy out the declared fields of `event`; the rest are left empty.
    pub fn project(&self, event: &Event) -> EventArgs {
        EventArgs {
            kind: event.kind.clone(),
            source: event.source.clone().filter(|_| self.source),
            target: event.target.clone().filter(|_| self.target),
            args: if self.args { event.args.clone() } else { Vec::new() },
            message: event.message.clone().filter(|_| self.message),
        }
    }
}

/// The fields of an [`Event`] a handler declared interest in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventArgs {
    pub kind: EventKind,
    pub source: Option<Source>,
    pub target: Option<Target>,
    pub args: Vec<String>,
    pub message: Option<String>,
}

impl Default for EventKind {
    fn default() -> Self {
        EventKind::Other(String::new())
    }
}

impl EventArgs {
    pub fn source_nick(&self) -> Option<&str> {
        self.source.as_ref().and_then(Source::nick)
    }

    pub fn target_str(&self) -> Option<&str> {
        self.target.as_ref().map(Target::as_str)
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_command() {
        assert_eq!(EventKind::from_command("PING"), EventKind::Ping);
        assert_eq!(
            EventKind::from_command("001"),
            EventKind::Numeric(Response::RPL_WELCOME)
        );
        assert_eq!(
            EventKind::from_command("WALLOPS"),
            EventKind::Other("WALLOPS".to_string())
        );
        // unknown numerics are not an error
        assert_eq!(
            EventKind::from_command("999"),
            EventKind::Other("999".to_string())
        );
    }

    #[test]
    fn test_config_names() {
        assert_eq!("PUBMSG".parse::<EventKind>().unwrap(), EventKind::Pubmsg);
        assert_eq!("join".parse::<EventKind>().unwrap(), EventKind::Join);
        assert_eq!(
            "353".parse::<EventKind>().unwrap(),
            EventKind::Numeric(Response::RPL_NAMREPLY)
        );
        assert_eq!(
            "364".parse::<EventKind>().unwrap(),
            EventKind::Numeric(Response::RPL_LINKS)
        );
        assert!("BOGUS".parse::<EventKind>().is_err());
        assert_eq!(EventKind::UserMode.to_string(), "UMODE");
    }

    #[test]
    fn test_projection() {
        let mut event = Event::new(EventKind::Pubmsg);
        event.source = Some(Source::User(User::parse("alice!a@h")));
        event.target = Some(Target::Name("#rust".into()));
        event.message = Some("hi".into());

        let args = Interest::NONE.source().message().project(&event);
        assert_eq!(args.source_nick(), Some("alice"));
        assert_eq!(args.target, None);
        assert_eq!(args.message(), "hi");

        assert_eq!(Interest::NONE.project(&event).message, None);
    }

    #[test]
    fn test_display_line() {
        let mut event = Event::new(EventKind::Privmsg);
        event.source = Some(Source::User(User::parse("alice!a@h")));
        event.target = Some(Target::Name("bob".into()));
        event.message = Some("hello there".into());
        assert_eq!(event.to_string(), ":alice!a@h PRIVMSG bob :hello there");
    }
}

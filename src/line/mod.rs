//! Protocol line parsing.
//!
//! A line is split once on ` :` into a head and a trailing message. The head
//! is whitespace-tokenised and read as `[source] command [target] [args...]`
//! depending on how many tokens it has. The parse is best effort: it never
//! rejects a line, it only classifies what it can.
//!
//! The parser also teaches the [`Server`] its own name. The first line with
//! exactly three head tokens (typically `:irc.host NOTICE * :...`) records
//! its source as the server's host, and from then on that prefix is reported
//! as [`Source::Server`] rather than as a user.

use tracing::trace;

use crate::casemap::{irc_eq, is_channel_name};
use crate::error::ProtocolError;
use crate::event::{Event, EventKind, Source, Target};
use crate::state::{Server, User};

/// Decode raw bytes as UTF-8 and [`parse`] them.
///
/// Trailing CR/LF is tolerated.
pub fn parse_line(server: &Server, raw: &[u8]) -> Result<Event, ProtocolError> {
    let line = String::from_utf8(raw.to_vec())?;
    Ok(parse(server, line.trim_end_matches(['\r', '\n'])))
}

/// Parse one line (without its CRLF) into an [`Event`].
///
/// ```
/// use slirc_client::event::{EventKind, Source};
/// use slirc_client::line::parse;
/// use slirc_client::state::Server;
///
/// let server = Server::new("irc.example.net", 6667, "bot", false);
/// let ping = parse(&server, "PING :irc.example.net");
/// assert_eq!(ping.kind, EventKind::Ping);
/// assert_eq!(ping.source, None);
/// assert_eq!(ping.message.as_deref(), Some("irc.example.net"));
/// ```
pub fn parse(server: &Server, line: &str) -> Event {
    let (head, message) = line.split_once(" :").unwrap_or((line, ""));
    let head = head.strip_prefix(':').unwrap_or(head);
    let tokens: Vec<&str> = head.split_whitespace().collect();

    let none: &[&str] = &[];
    let (raw_source, command, target, args) = match tokens.as_slice() {
        [] => ("", "", "", none),
        [command] => ("", *command, "", none),
        [source, command] => (*source, *command, "", none),
        [source, command, target] => {
            if server.learn_host(source) {
                trace!(server = %server, host = %source, "learned server host");
            }
            (*source, *command, *target, none)
        }
        [source, command, target, args @ ..] => (*source, *command, *target, args),
    };

    let source = if raw_source.is_empty() {
        None
    } else if server.actual_host().as_deref() == Some(raw_source) {
        Some(Source::Server(raw_source.to_string()))
    } else {
        Some(Source::User(User::parse(raw_source)))
    };

    let to_channel = is_channel_name(target);
    let kind = match EventKind::from_command(command) {
        EventKind::Privmsg if to_channel => EventKind::Pubmsg,
        EventKind::Mode if !to_channel => EventKind::UserMode,
        EventKind::PrivNotice if to_channel => EventKind::PubNotice,
        kind => kind,
    };

    let target = if target.is_empty() {
        None
    } else if server
        .actual_nick()
        .is_some_and(|nick| irc_eq(&nick, target))
    {
        Some(Target::User(User::parse(target)))
    } else {
        Some(Target::Name(target.to_string()))
    };

    Event {
        kind,
        source,
        target,
        args: args.iter().map(|s| s.to_string()).collect(),
        message: (!message.is_empty()).then(|| message.to_string()),
    }
}

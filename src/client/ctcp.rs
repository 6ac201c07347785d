//! Client-to-client protocol requests carried in PRIVMSG.

use chrono::{DateTime, Local};

/// CTCP payloads are wrapped in this byte.
pub const DELIM: char = '\x01';

/// A CTCP request: `\x01COMMAND [arg]\x01`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CtcpRequest<'a> {
    pub command: &'a str,
    pub arg: &'a str,
}

/// Unwrap a CTCP request, or `None` for an ordinary message.
pub fn parse(message: &str) -> Option<CtcpRequest<'_>> {
    let inner = message.strip_prefix(DELIM)?.strip_suffix(DELIM)?;
    let (command, arg) = inner.split_once(' ').unwrap_or((inner, ""));
    Some(CtcpRequest { command, arg })
}

/// The reply text for the requests we answer.
pub fn reply(request: &CtcpRequest<'_>, version: &str, now: DateTime<Local>) -> Option<String> {
    match request.command.to_ascii_uppercase().as_str() {
        "VERSION" => Some(version.to_string()),
        "PING" if !request.arg.is_empty() => Some(request.arg.to_string()),
        "TIME" => Some(format!(":{}", now.format("%a %b %e %H:%M:%S %Y"))),
        _ => None,
    }
}

/// Wrap a reply for sending in a NOTICE.
pub fn wrap(command: &str, reply: &str) -> String {
    format!("{0}{1} {2}{0}", DELIM, command.to_ascii_uppercase(), reply)
}

//! Outbound command encoding.
//!
//! [`Outbound`] covers every command the client sends on its own or on a
//! plugin's behalf. It formats with [`Display`](std::fmt::Display) (no line
//! terminator) and encodes with [`IrcEncode`] (CRLF-terminated bytes, ready
//! for the socket).
//!
//! # Example
//!
//! ```
//! use slirc_client::encode::{IrcEncode, Outbound};
//!
//! let msg = Outbound::privmsg("#channel", "Hello!");
//! assert_eq!(msg.to_string(), "PRIVMSG #channel :Hello!");
//! assert_eq!(&msg.to_bytes(), b"PRIVMSG #channel :Hello!\r\n");
//! ```

use std::fmt;
use std::io::{self, Write};

/// A trait for encoding protocol lines directly to a byte stream.
pub trait IrcEncode {
    /// Encode this value, CRLF included, to the given writer.
    ///
    /// Returns the number of bytes written on success.
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<usize>;

    /// Encode this value to a new `Vec<u8>`.
    #[must_use]
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(512);
        let _ = self.encode(&mut buf);
        buf
    }
}

/// A command the client sends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    /// `NICK nick`
    Nick(String),
    /// `USER username 0 * :realname`
    User { username: String, realname: String },
    /// `JOIN #a,#b [key1,key2]`
    Join {
        channels: Vec<String>,
        keys: Vec<String>,
    },
    /// `PART #a,#b`
    Part(Vec<String>),
    /// `MODE target [modes]`; without modes this queries the target's modes.
    Mode {
        target: String,
        modes: Option<String>,
    },
    /// `KICK #channel nick :reason`
    Kick {
        channel: String,
        user: String,
        reason: String,
    },
    /// `QUIT :message`, or a bare `QUIT`.
    Quit(Option<String>),
    /// `PRIVMSG target :text`
    Privmsg { target: String, text: String },
    /// `NOTICE target :text`
    Notice { target: String, text: String },
    /// `PONG server :token`
    Pong { server: String, token: String },
    /// A preformatted line.
    Raw(String),
}

impl Outbound {
    pub fn privmsg(target: &str, text: &str) -> Self {
        Outbound::Privmsg {
            target: target.to_string(),
            text: text.to_string(),
        }
    }

    pub fn notice(target: &str, text: &str) -> Self {
        Outbound::Notice {
            target: target.to_string(),
            text: text.to_string(),
        }
    }

    pub fn join<S: AsRef<str>>(channels: &[S]) -> Self {
        Outbound::Join {
            channels: channels.iter().map(|c| c.as_ref().to_string()).collect(),
            keys: Vec::new(),
        }
    }

    pub fn part<S: AsRef<str>>(channels: &[S]) -> Self {
        Outbound::Part(channels.iter().map(|c| c.as_ref().to_string()).collect())
    }

    /// Our registration pair uses the nick for every USER field.
    pub fn user(nick: &str) -> Self {
        Outbound::User {
            username: nick.to_string(),
            realname: nick.to_string(),
        }
    }

    /// The command token, e.g. `"PRIVMSG"`.
    pub fn command(&self) -> &'static str {
        match self {
            Outbound::Nick(_) => "NICK",
            Outbound::User { .. } => "USER",
            Outbound::Join { .. } => "JOIN",
            Outbound::Part(_) => "PART",
            Outbound::Mode { .. } => "MODE",
            Outbound::Kick { .. } => "KICK",
            Outbound::Quit(_) => "QUIT",
            Outbound::Privmsg { .. } => "PRIVMSG",
            Outbound::Notice { .. } => "NOTICE",
            Outbound::Pong { .. } => "PONG",
            Outbound::Raw(_) => "",
        }
    }
}

/// Cut a field at the first CR or LF so it can't smuggle a second command.
#[inline]
fn single_line(s: &str) -> &str {
    match s.find(['\r', '\n']) {
        Some(end) => &s[..end],
        None => s,
    }
}

/// Write a command with middle arguments only.
fn write_cmd<W: fmt::Write>(w: &mut W, cmd: &str, args: &[&str]) -> fmt::Result {
    w.write_str(cmd)?;
    for arg in args {
        w.write_char(' ')?;
        w.write_str(single_line(arg))?;
    }
    Ok(())
}

/// Write a command whose last argument is always colon-prefixed free text.
fn write_cmd_freeform<W: fmt::Write>(w: &mut W, cmd: &str, args: &[&str]) -> fmt::Result {
    let Some((last, middle)) = args.split_last() else {
        return w.write_str(cmd);
    };
    write_cmd(w, cmd, middle)?;
    w.write_str(" :")?;
    w.write_str(single_line(last))
}

impl fmt::Display for Outbound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cmd = self.command();
        match self {
            Outbound::Nick(nick) => write_cmd(f, cmd, &[nick.as_str()]),
            Outbound::User { username, realname } => {
                write_cmd_freeform(f, cmd, &[username.as_str(), "0", "*", realname.as_str()])
            }
            Outbound::Join { channels, keys } => {
                let channels = channels.join(",");
                if keys.is_empty() {
                    write_cmd(f, cmd, &[channels.as_str()])
                } else {
                    write_cmd(f, cmd, &[channels.as_str(), keys.join(",").as_str()])
                }
            }
            Outbound::Part(channels) => write_cmd(f, cmd, &[channels.join(",").as_str()]),
            Outbound::Mode { target, modes } => match modes {
                Some(modes) => write_cmd(f, cmd, &[target.as_str(), modes.as_str()]),
                None => write_cmd(f, cmd, &[target.as_str()]),
            },
            Outbound::Kick {
                channel,
                user,
                reason,
            } => write_cmd_freeform(f, cmd, &[channel, user, reason].map(String::as_str)),
            Outbound::Quit(Some(message)) => write_cmd_freeform(f, cmd, &[message.as_str()]),
            Outbound::Quit(None) => f.write_str(cmd),
            Outbound::Privmsg { target, text } | Outbound::Notice { target, text } => {
                write_cmd_freeform(f, cmd, &[target.as_str(), text.as_str()])
            }
            Outbound::Pong { server, token } => {
                write_cmd_freeform(f, cmd, &[server.as_str(), token.as_str()])
            }
            Outbound::Raw(line) => f.write_str(single_line(line)),
        }
    }
}

impl IrcEncode for Outbound {
    fn encode<W: Write>(&self, writer: &mut W) -> io::Result<usize> {
        let line = format!("{}\r\n", self);
        writer.write_all(line.as_bytes())?;
        Ok(line.len())
    }
}

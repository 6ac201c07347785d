//! Users and their per-channel status.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

use nom::{
    bytes::complete::take_till,
    character::complete::{char, one_of},
    combinator::{opt, rest},
    multi::many0,
    sequence::{preceded, tuple},
    IResult,
};

use crate::casemap::irc_to_lower;
use crate::mode::Mode;

/// Channel status bitmask.
///
/// A user may hold several statuses at once (`+o` and `+v`), so the flags
/// combine with `|` and are cleared with `& !`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Status(u8);

impl Status {
    /// No channel privileges.
    pub const NORMAL: Status = Status(1);
    /// `+v`
    pub const VOICE: Status = Status(2);
    /// `+h`
    pub const HALFOP: Status = Status(4);
    /// `+o`
    pub const OP: Status = Status(8);
    /// `+a`
    pub const PROTECTED: Status = Status(16);
    /// `+q`
    pub const FOUNDER: Status = Status(32);

    /// Raw bit value.
    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every flag in `other` is set.
    #[inline]
    pub fn contains(self, other: Status) -> bool {
        self.0 & other.0 == other.0
    }

    /// Maps a NAMES prefix character (`@`, `+`, ...) to its status.
    pub fn from_prefix(c: char) -> Option<Status> {
        match c {
            ' ' => Some(Status::NORMAL),
            '+' => Some(Status::VOICE),
            '%' => Some(Status::HALFOP),
            '@' => Some(Status::OP),
            '&' => Some(Status::PROTECTED),
            '~' => Some(Status::FOUNDER),
            _ => None,
        }
    }

    /// Maps a channel mode character (`o`, `v`, ...) to its status.
    pub fn from_mode(c: char) -> Option<Status> {
        match c {
            'v' => Some(Status::VOICE),
            'h' => Some(Status::HALFOP),
            'o' => Some(Status::OP),
            'a' => Some(Status::PROTECTED),
            'q' => Some(Status::FOUNDER),
            _ => None,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::NORMAL
    }
}

impl BitOr for Status {
    type Output = Status;
    fn bitor(self, rhs: Status) -> Status {
        Status(self.0 | rhs.0)
    }
}

impl BitOrAssign for Status {
    fn bitor_assign(&mut self, rhs: Status) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Status {
    type Output = Status;
    fn bitand(self, rhs: Status) -> Status {
        Status(self.0 & rhs.0)
    }
}

impl Not for Status {
    type Output = Status;
    fn not(self) -> Status {
        Status(!self.0)
    }
}

/// An IRC user: case-folded nick, optional username and host, and status.
///
/// Equality and hashing cover nick, username and host only. Status is
/// mutable state that mode changes update on an otherwise-equal user.
#[derive(Clone, Debug)]
pub struct User {
    nick: String,
    username: Option<String>,
    host: Option<String>,
    status: Status,
}

impl User {
    /// Create a user. The nick is case-folded; empty username/host are dropped.
    pub fn new(
        nick: &str,
        username: Option<&str>,
        host: Option<&str>,
        status: Status,
    ) -> Self {
        let non_empty = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(str::to_string);
        Self {
            nick: irc_to_lower(nick),
            username: non_empty(username),
            host: non_empty(host),
            status,
        }
    }

    /// A bare channel member record: nick only, normal status.
    pub fn member(nick: &str) -> Self {
        Self::new(nick, None, None, Status::NORMAL)
    }

    /// Parse `[status]nick[!user][@host]`.
    ///
    /// Never fails: anything that doesn't look like a mask is taken as a
    /// bare nick.
    ///
    /// ```
    /// use slirc_client::state::{Status, User};
    ///
    /// let user = User::parse("Alice!alice@example.com");
    /// assert_eq!(user.nick(), "alice");
    /// assert_eq!(user.username(), Some("alice"));
    /// assert_eq!(user.host(), Some("example.com"));
    ///
    /// let op = User::parse("@bob");
    /// assert!(op.status().contains(Status::OP));
    /// ```
    pub fn parse(mask: &str) -> Self {
        match parse_mask(mask) {
            Ok((_, (prefixes, nick, username, host))) => {
                let status = prefixes
                    .into_iter()
                    .filter_map(Status::from_prefix)
                    .reduce(|a, b| a | b)
                    .unwrap_or_default();
                Self::new(nick, username, host, status)
            }
            Err(_) => Self::member(mask),
        }
    }

    /// Case-folded nick.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Username (ident), if known.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Host, if known.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Current channel status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Grant the status a mode stands for. Returns false for non-status modes.
    pub fn add_mode(&mut self, mode: &Mode) -> bool {
        match Status::from_mode(mode.character) {
            Some(status) => {
                self.status |= status;
                true
            }
            None => false,
        }
    }

    /// Revoke the status a mode stands for. Returns false for non-status modes.
    pub fn remove_mode(&mut self, mode: &Mode) -> bool {
        match Status::from_mode(mode.character) {
            Some(status) => {
                self.status = self.status & !status;
                true
            }
            None => false,
        }
    }

    pub(crate) fn rename(&mut self, nick: &str) {
        self.nick = irc_to_lower(nick);
    }
}

type Mask<'a> = (Vec<char>, &'a str, Option<&'a str>, Option<&'a str>);

fn parse_mask(input: &str) -> IResult<&str, Mask<'_>> {
    tuple((
        many0(one_of(" +%@&~")),
        take_till(|c| c == '!' || c == '@'),
        opt(preceded(char('!'), take_till(|c| c == '@'))),
        opt(preceded(char('@'), rest)),
    ))(input)
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.nick == other.nick && self.username == other.username && self.host == other.host
    }
}

impl Eq for User {}

impl Hash for User {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nick.hash(state);
        self.username.hash(state);
        self.host.hash(state);
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.nick)?;
        if let Some(username) = &self.username {
            write!(f, "!{}", username)?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{}", host)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_mask() {
        let user = User::parse("Nick!ident@host.example");
        assert_eq!(user.nick(), "nick");
        assert_eq!(user.username(), Some("ident"));
        assert_eq!(user.host(), Some("host.example"));
        assert_eq!(user.status(), Status::NORMAL);
        assert_eq!(user.to_string(), "nick!ident@host.example");
    }

    #[test]
    fn test_parse_bare_nick() {
        let user = User::parse("alice");
        assert_eq!(user, User::member("ALICE"));
        assert_eq!(user.username(), None);
    }

    #[test]
    fn test_parse_names_prefixes() {
        assert!(User::parse("+carol").status().contains(Status::VOICE));
        assert!(User::parse("~dave").status().contains(Status::FOUNDER));

        let both = User::parse("@+erin");
        assert_eq!(both.nick(), "erin");
        assert!(both.status().contains(Status::OP));
        assert!(both.status().contains(Status::VOICE));
    }

    #[test]
    fn test_equality_ignores_status() {
        let mut a = User::member("frank");
        let b = User::parse("@frank");
        assert_eq!(a, b);
        a.add_mode(&Mode::new('o', None, true));
        assert!(a.status().contains(Status::OP));
    }

    #[test]
    fn test_mode_bitmask() {
        let mut user = User::member("gina");
        assert!(user.add_mode(&Mode::new('o', Some("gina"), true)));
        assert!(user.add_mode(&Mode::new('v', Some("gina"), true)));
        assert!(user.remove_mode(&Mode::new('o', Some("gina"), false)));
        assert!(!user.status().contains(Status::OP));
        assert!(user.status().contains(Status::VOICE));
        assert!(user.status().contains(Status::NORMAL));

        // removing a status that isn't held leaves the rest alone
        assert!(user.remove_mode(&Mode::new('h', None, false)));
        assert!(user.status().contains(Status::VOICE));

        assert!(!user.add_mode(&Mode::new('b', None, true)));
    }
}

//! Channel and user modes.
//!
//! A [`Mode`] is a single flag change: its character, whether it is being
//! set or cleared, and an optional parameter. [`decode`] expands a compound
//! mode string into one `Mode` per character.

mod parse;

use std::fmt;

pub use self::parse::decode;

/// A single mode change, e.g. `+o alice` or `-t`.
///
/// Two modes are equal when their characters match. A channel therefore holds
/// at most one `Mode` per character, whatever its parameter or polarity.
#[derive(Clone, Debug)]
pub struct Mode {
    /// The mode character (`o`, `v`, `k`, `t`, ...).
    pub character: char,
    /// Parameter bound to this change, if any.
    pub param: Option<String>,
    /// `true` for `+`, `false` for `-`.
    pub on: bool,
}

impl Mode {
    /// Create a mode change.
    pub fn new(character: char, param: Option<&str>, on: bool) -> Self {
        Self {
            character,
            param: param.map(str::to_string),
            on,
        }
    }

    /// The parameter as a string slice.
    pub fn param(&self) -> Option<&str> {
        self.param.as_deref()
    }
}

impl PartialEq for Mode {
    fn eq(&self, other: &Self) -> bool {
        self.character == other.character
    }
}

impl Eq for Mode {}

impl std::hash::Hash for Mode {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.character.hash(state);
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.on { '+' } else { '-' };
        match &self.param {
            Some(param) => write!(f, "{}{} {}", sign, self.character, param),
            None => write!(f, "{}{}", sign, self.character),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_by_character() {
        assert_eq!(Mode::new('k', Some("a"), true), Mode::new('k', Some("b"), false));
        assert_ne!(Mode::new('k', None, true), Mode::new('l', None, true));
    }

    #[test]
    fn test_display() {
        assert_eq!(Mode::new('o', Some("alice"), true).to_string(), "+o alice");
        assert_eq!(Mode::new('t', None, false).to_string(), "-t");
    }
}

//! IRC case folding and target classification.
//!
//! Nicks and channel names are compared case-insensitively using the
//! `rfc1459` mapping, where `[]\~` are the uppercase forms of `{}|^`.

/// Characters that mark a target as a channel name.
pub const CHANNEL_SIGILS: [char; 4] = ['#', '&', '+', '!'];

#[inline]
fn fold(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        _ => c.to_ascii_lowercase(),
    }
}

/// Convert a string to IRC lowercase using RFC 1459 case mapping.
///
/// ```
/// use slirc_client::casemap::irc_to_lower;
///
/// assert_eq!(irc_to_lower("Nick[Away]"), "nick{away}");
/// ```
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(fold).collect()
}

/// Compare two strings using IRC case-insensitive comparison.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.chars().map(fold).eq(b.chars().map(fold))
}

/// Returns true if `target` starts with a channel sigil.
///
/// ```
/// use slirc_client::casemap::is_channel_name;
///
/// assert!(is_channel_name("#rust"));
/// assert!(!is_channel_name("alice"));
/// assert!(!is_channel_name(""));
/// ```
#[inline]
pub fn is_channel_name(target: &str) -> bool {
    target.starts_with(CHANNEL_SIGILS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_special_chars() {
        assert_eq!(irc_to_lower("A[B]C\\D~"), "a{b}c|d^");
    }

    #[test]
    fn test_irc_eq() {
        assert!(irc_eq("Alice", "alice"));
        assert!(irc_eq("nick[1]", "NICK{1}"));
        assert!(!irc_eq("alice", "alicia"));
    }

    #[test]
    fn test_channel_sigils() {
        for name in ["#a", "&a", "+a", "!a"] {
            assert!(is_channel_name(name), "{name} should be a channel");
        }
        assert!(!is_channel_name("a#"));
    }
}

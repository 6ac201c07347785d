//! Compound mode string decoding.

use super::Mode;

#[derive(Clone, Copy)]
enum PlusMinus {
    Plus,
    Minus,
}

/// Decode a mode string such as `+o-v` with its arguments.
///
/// Runs are expanded in the order their signs appear in the text, one
/// [`Mode`] per mode character. Arguments bind by position: the n-th mode
/// character (counting across all runs) takes `args[n]` when it exists, so
/// surplus mode characters at the end get no parameter.
///
/// A string that does not start with `+` or `-` decodes to nothing. The
/// decoder never fails.
///
/// ```
/// use slirc_client::mode::decode;
///
/// let ops = decode("+o-v", &["alice", "bob"]);
/// assert_eq!(ops.len(), 2);
/// assert!(ops[0].on && ops[0].character == 'o' && ops[0].param() == Some("alice"));
/// assert!(!ops[1].on && ops[1].character == 'v' && ops[1].param() == Some("bob"));
///
/// let ops = decode("+ov", &["alice"]);
/// assert_eq!(ops[0].param(), Some("alice"));
/// assert_eq!(ops[1].param(), None);
/// ```
pub fn decode<S: AsRef<str>>(modes: &str, args: &[S]) -> Vec<Mode> {
    use self::PlusMinus::*;

    let mut chars = modes.chars();
    let mut cur_mod = match chars.next() {
        Some('+') => Plus,
        Some('-') => Minus,
        _ => return Vec::new(),
    };

    let mut res = Vec::with_capacity(modes.len());
    let mut args = args.iter().map(AsRef::as_ref);

    for c in chars {
        match c {
            '+' => cur_mod = Plus,
            '-' => cur_mod = Minus,
            _ => {
                let on = matches!(cur_mod, Plus);
                res.push(Mode::new(c, args.next(), on));
            }
        }
    }

    res
}

//! Property-based tests for the line parser and mode decoder.
//!
//! 1. A line assembled from valid parts parses back into those parts, and
//!    its `Display` reproduces the line.
//! 2. The parser accepts any text without panicking.
//! 3. The mode decoder emits exactly one change per mode character.

use proptest::prelude::*;
use slirc_client::event::EventKind;
use slirc_client::line::parse;
use slirc_client::mode::decode;
use slirc_client::state::Server;

// =============================================================================
// STRATEGIES
// =============================================================================

/// Lowercase so case folding leaves it untouched.
fn nickname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z_][a-z0-9_\\-]{0,8}").expect("valid regex")
}

fn username_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,9}").expect("valid regex")
}

fn hostname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]+(\\.[a-z0-9]+){0,3}").expect("valid regex")
}

fn channel_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[#&][a-z0-9_\\-]{1,20}").expect("valid regex")
}

/// Trailing text: no CR/LF, and it must not start with a space or be empty
/// so the ` :` split point stays unambiguous.
fn message_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[^\r\n\0 ][^\r\n\0]{0,200}").expect("valid regex")
}

fn middle_arg_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9=#+\\-]{1,12}").expect("valid regex")
}

fn mode_string_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[+\\-][+\\-a-zA-Z]{0,16}").expect("valid regex")
}

/// A server that has already learned its host, so three-token lines from
/// users are not mistaken for the server greeting.
fn server() -> Server {
    let server = Server::new("irc.example.net", 6667, "me", false);
    server.learn_host("irc.example.net");
    server.set_actual_nick("me");
    server
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn channel_message_roundtrip(
        nick in nickname_strategy(),
        user in username_strategy(),
        host in hostname_strategy(),
        channel in channel_strategy(),
        text in message_strategy(),
    ) {
        let server = server();
        let line = format!(":{nick}!{user}@{host} PRIVMSG {channel} :{text}");
        let event = parse(&server, &line);

        prop_assert_eq!(&event.kind, &EventKind::Pubmsg);
        prop_assert_eq!(event.source_nick(), Some(nick.as_str()));
        prop_assert_eq!(event.target_str(), Some(channel.as_str()));
        prop_assert_eq!(event.message.as_deref(), Some(text.as_str()));
        prop_assert_eq!(event.to_string(), line);
    }

    #[test]
    fn middle_arguments_roundtrip(
        channel in channel_strategy(),
        args in prop::collection::vec(middle_arg_strategy(), 0..6),
        text in prop::option::of(message_strategy()),
    ) {
        let server = server();
        let mut line = format!(":irc.example.net 324 me {channel}");
        for arg in &args {
            line.push(' ');
            line.push_str(arg);
        }
        if let Some(text) = &text {
            line.push_str(" :");
            line.push_str(text);
        }

        let event = parse(&server, &line);
        let mut expected = vec![channel.clone()];
        expected.extend(args.iter().cloned());
        prop_assert_eq!(&event.args, &expected);
        prop_assert_eq!(&event.message, &text);
        prop_assert_eq!(event.to_string(), line);
    }

    #[test]
    fn parse_never_panics(input in "[^\r\n]{0,600}") {
        let _ = parse(&server(), &input);
    }

    #[test]
    fn decode_emits_one_change_per_mode_char(
        modes in mode_string_strategy(),
        args in prop::collection::vec(nickname_strategy(), 0..20),
    ) {
        let ops = decode(&modes, &args);
        let mode_chars: Vec<char> = modes.chars().filter(|c| *c != '+' && *c != '-').collect();
        prop_assert_eq!(ops.len(), mode_chars.len());

        for (i, (op, c)) in ops.iter().zip(&mode_chars).enumerate() {
            prop_assert_eq!(op.character, *c);
            prop_assert_eq!(op.param(), args.get(i).map(String::as_str));
        }
    }

    #[test]
    fn decode_accepts_arbitrary_text(
        modes in ".{0,40}",
        args in prop::collection::vec(".{0,10}", 0..5),
    ) {
        let ops = decode(&modes, &args);
        prop_assert!(ops.len() <= modes.chars().count());
    }
}

//! Line parsing against realistic server transcripts.

use slirc_client::event::{EventKind, Source, Target};
use slirc_client::line::{parse, parse_line};
use slirc_client::response::Response;
use slirc_client::state::{Server, Status};
use slirc_client::ProtocolError;

fn registered() -> Server {
    let server = Server::new("irc.example.net", 6667, "bot", false);
    parse(&server, ":hub.example.net NOTICE * :*** Looking up your hostname...");
    server.set_actual_nick("bot");
    server
}

#[test]
fn welcome_burst() {
    let server = Server::new("irc.example.net", 6667, "bot", false);
    let transcript = [
        ":hub.example.net NOTICE * :*** Looking up your hostname...",
        ":hub.example.net 001 bot :Welcome to the Example IRC Network bot",
        ":hub.example.net 002 bot :Your host is hub.example.net",
        ":hub.example.net 005 bot CHANTYPES=# PREFIX=(ov)@+ :are supported by this server",
        ":hub.example.net 375 bot :- hub.example.net Message of the Day -",
        ":hub.example.net 376 bot :End of /MOTD command.",
    ];
    let events: Vec<_> = transcript.iter().map(|line| parse(&server, line)).collect();

    assert_eq!(server.actual_host().as_deref(), Some("hub.example.net"));
    assert!(events
        .iter()
        .all(|e| e.source == Some(Source::Server("hub.example.net".into()))));
    assert_eq!(events[1].kind, EventKind::Numeric(Response::RPL_WELCOME));
    assert_eq!(events[3].kind, EventKind::Numeric(Response::RPL_BOUNCE));
    assert_eq!(events[3].args, vec!["CHANTYPES=#", "PREFIX=(ov)@+"]);
    assert_eq!(events[5].kind, EventKind::Numeric(Response::RPL_ENDOFMOTD));
}

#[test]
fn host_is_learned_once() {
    let server = Server::new("irc.example.net", 6667, "bot", false);
    parse(&server, ":first.example.net NOTICE * :hello");
    parse(&server, ":alice!a@host PRIVMSG bot :hi");
    assert_eq!(server.actual_host().as_deref(), Some("first.example.net"));
}

#[test]
fn chat_messages() {
    let server = registered();

    let public = parse(&server, ":Alice!alice@example.org PRIVMSG #Rust :hello :) all");
    assert_eq!(public.kind, EventKind::Pubmsg);
    assert_eq!(public.source_nick(), Some("alice"));
    assert_eq!(public.target, Some(Target::Name("#Rust".into())));
    assert_eq!(public.message.as_deref(), Some("hello :) all"));

    let private = parse(&server, ":alice!alice@example.org PRIVMSG BOT :psst");
    assert_eq!(private.kind, EventKind::Privmsg);
    assert!(matches!(private.target, Some(Target::User(ref u)) if u.nick() == "bot"));

    let notice = parse(&server, ":alice!alice@example.org NOTICE #rust :heads up");
    assert_eq!(notice.kind, EventKind::PubNotice);
}

#[test]
fn membership_lines() {
    let server = registered();

    let join = parse(&server, ":carol!c@host JOIN :#rust");
    assert_eq!(join.kind, EventKind::Join);
    assert_eq!(join.target, None);
    assert_eq!(join.message.as_deref(), Some("#rust"));

    let kick = parse(&server, ":op!o@host KICK #rust carol :flooding");
    assert_eq!(kick.kind, EventKind::Kick);
    assert_eq!(kick.target_str(), Some("#rust"));
    assert_eq!(kick.args, vec!["carol"]);
    assert_eq!(kick.message.as_deref(), Some("flooding"));

    let quit = parse(&server, ":carol!c@host QUIT :Quit: bye");
    assert_eq!(quit.kind, EventKind::Quit);
    assert_eq!(quit.message.as_deref(), Some("Quit: bye"));
}

#[test]
fn names_reply_entries_keep_prefixes() {
    let server = registered();
    let names = parse(&server, ":hub.example.net 353 bot = #rust :@alice +bob carol");
    assert_eq!(names.kind, EventKind::Numeric(Response::RPL_NAMREPLY));
    assert_eq!(names.args.last().map(String::as_str), Some("#rust"));

    let statuses: Vec<Status> = names
        .message
        .as_deref()
        .unwrap_or_default()
        .split_whitespace()
        .map(|entry| slirc_client::User::parse(entry).status())
        .collect();
    assert_eq!(statuses, vec![Status::OP, Status::VOICE, Status::NORMAL]);
}

#[test]
fn unknown_commands_pass_through() {
    let server = registered();
    let event = parse(&server, ":hub.example.net CAP * LS :multi-prefix sasl");
    assert_eq!(event.kind, EventKind::Other("CAP".into()));
    assert_eq!(event.args, vec!["LS"]);

    let links = parse(
        &server,
        ":hub.example.net 364 bot leaf.example.net hub.example.net :1 leaf",
    );
    assert_eq!(links.kind, EventKind::Numeric(Response::RPL_LINKS));

    let numeric = parse(&server, ":hub.example.net 999 bot :made up");
    assert_eq!(numeric.kind, EventKind::Other("999".into()));
}

#[test]
fn degenerate_lines() {
    let server = registered();
    assert_eq!(parse(&server, "").kind, EventKind::Other(String::new()));
    assert_eq!(parse(&server, ":").kind, EventKind::Other(String::new()));
    let only_trailing = parse(&server, " :just text");
    assert_eq!(only_trailing.message.as_deref(), Some("just text"));
}

#[test]
fn bytes_must_be_utf8() {
    let server = registered();
    let event = parse_line(&server, b"PING :token\r\n").unwrap();
    assert_eq!(event.message.as_deref(), Some("token"));

    let err = parse_line(&server, b"PRIVMSG #rust :\xff\xfe\r\n").unwrap_err();
    assert!(matches!(err, ProtocolError::Decode(_)));
}

#[test]
fn display_reassembles_line() {
    let server = registered();
    let line = ":alice!a@host KICK #rust carol :flooding";
    assert_eq!(parse(&server, line).to_string(), line);
}

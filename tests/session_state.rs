//! Channel and session bookkeeping across several servers.

use std::sync::Arc;

use slirc_client::mode::{decode, Mode};
use slirc_client::state::{Server, Session, Status, User};

fn servers() -> (Arc<Server>, Arc<Server>) {
    (
        Arc::new(Server::new("irc.libera.chat", 6697, "bot", true)),
        Arc::new(Server::new("irc.oftc.net", 6697, "bot", true)),
    )
}

#[test]
fn channels_are_scoped_per_server() {
    let session = Session::new();
    let (libera, oftc) = servers();

    let a = session.add_channel(&libera, "#Rust");
    let b = session.add_channel(&oftc, "#rust");
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&a, &session.add_channel(&libera, "#RUST")));
    assert_eq!(session.channels().len(), 2);

    assert!(session.remove_channel(&libera, "#rust"));
    assert!(session.find_channel(&libera, "#rust").is_none());
    assert!(session.find_channel(&oftc, "#rust").is_some());
}

#[test]
fn clear_server_forgets_only_that_server() {
    let session = Session::new();
    let (libera, oftc) = servers();
    session.add_channel(&libera, "#a");
    session.add_channel(&libera, "#b");
    session.add_channel(&oftc, "#c");

    session.clear_server(&libera);
    assert!(session.server_channels(&libera).is_empty());
    assert_eq!(session.server_channels(&oftc).len(), 1);
}

#[test]
fn names_then_modes_then_nick_change() {
    let session = Session::new();
    let (libera, _) = servers();
    let channel = session.add_channel(&libera, "#rust");

    for entry in "@Alice +bob carol".split_whitespace() {
        channel.add_user(User::parse(entry));
    }
    assert_eq!(channel.user_count(), 3);
    assert!(channel.in_channel("ALICE"));

    for op in decode("+v-o", &["carol", "alice"]) {
        let param = op.param().unwrap_or_default().to_string();
        assert!(channel.apply_user_mode(&param, &op));
    }
    assert!(channel
        .find_user("alice")
        .is_some_and(|u| !u.status().contains(Status::OP)));
    assert!(channel
        .find_user("carol")
        .is_some_and(|u| u.status().contains(Status::VOICE)));

    assert!(channel.rename_user("bob", "Robert"));
    let robert = channel.find_user("robert").unwrap();
    assert_eq!(robert.status(), Status::VOICE);
    assert!(!channel.in_channel("bob"));
}

#[test]
fn channel_modes_hold_one_entry_per_character() {
    let session = Session::new();
    let (libera, _) = servers();
    let channel = session.add_channel(&libera, "#rust");

    for op in decode("+knt", &["first"]) {
        channel.add_mode(op);
    }
    channel.add_mode(Mode::new('k', Some("second"), true));
    assert_eq!(channel.modes().len(), 3);
    assert_eq!(
        channel
            .modes()
            .iter()
            .find(|m| m.character == 'k')
            .and_then(|m| m.param().map(str::to_string)),
        Some("second".to_string())
    );

    assert!(channel.remove_mode(&Mode::new('t', None, false)));
    assert!(!channel.has_mode('t'));
    assert!(!channel.remove_mode(&Mode::new('t', None, false)));
}

#[test]
fn status_modes_on_missing_members_are_rejected() {
    let session = Session::new();
    let (libera, _) = servers();
    let channel = session.add_channel(&libera, "#rust");
    assert!(!channel.apply_user_mode("ghost", &Mode::new('o', Some("ghost"), true)));

    channel.add_user(User::member("alice"));
    assert!(!channel.apply_user_mode("alice", &Mode::new('k', Some("alice"), true)));
}

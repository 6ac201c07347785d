//! End-to-end registration and state tracking against a scripted server.

mod common;

use std::time::Duration;

use slirc_client::client::{Client, ClientOptions};
use slirc_client::connection::ConnectionState;
use slirc_client::state::{Server, Status};

use common::ScriptedServer;

fn options() -> ClientOptions {
    ClientOptions {
        version: "slirc-test 1.0".to_string(),
        poll_timeout: Duration::from_millis(20),
        connect_attempts: 1,
        connect_retry: Duration::from_millis(10),
        shutdown_grace: Duration::from_millis(100),
        ..ClientOptions::default()
    }
}

#[tokio::test]
async fn registers_joins_and_tracks_channel() {
    let ircd = ScriptedServer::bind().await;
    let server = Server::new("127.0.0.1", ircd.port(), "bot", false)
        .with_channels(vec!["#test".to_string()]);
    let client = Client::new(vec![server], options()).unwrap();
    let runner = tokio::spawn({
        let client = client.clone();
        async move { client.start().await }
    });

    let mut peer = ircd.accept().await;
    peer.expect("NICK bot").await;
    peer.expect("USER bot 0 * :bot").await;

    peer.send(":srv.test NOTICE * :*** Looking up your hostname").await;
    peer.send(":srv.test 433 * bot :Nickname is already in use").await;
    peer.expect("NICK bot_").await;
    peer.expect("USER bot_ 0 * :bot_").await;

    peer.send(":srv.test 001 bot_ :Welcome to the test network bot_").await;
    peer.expect("JOIN #test").await;

    peer.send(":bot_!bot_@client.test JOIN :#test").await;
    peer.expect("MODE #test").await;

    peer.send(":srv.test 353 bot_ = #test :@alice +bob bot_").await;
    peer.send(":srv.test 366 bot_ #test :End of /NAMES list.").await;
    peer.send(":srv.test 324 bot_ #test +knt secret").await;
    peer.send(":carol!c@elsewhere JOIN #test").await;
    peer.send(":alice!a@elsewhere MODE #test +o-v carol bob").await;
    peer.send(":alice!a@elsewhere KICK #test bob :enough").await;
    peer.send(":dave!d@elsewhere PART #test").await;
    peer.sync("state").await;

    let server = client.servers().remove(0);
    assert_eq!(server.actual_nick().as_deref(), Some("bot_"));
    assert_eq!(server.actual_host().as_deref(), Some("srv.test"));
    let connection = client.find_connection(&server).unwrap();
    assert_eq!(connection.state(), ConnectionState::Welcomed);

    let channel = client.find_channel(&server, "#TEST").unwrap();
    assert!(channel.in_channel("alice"));
    assert!(channel.in_channel("bot_"));
    assert!(!channel.in_channel("bob"));
    assert!(channel
        .find_user("carol")
        .is_some_and(|u| u.status().contains(Status::OP)));
    assert!(channel.has_mode('n') && channel.has_mode('t') && channel.has_mode('k'));

    peer.send(":alice!a@elsewhere NICK :alicia").await;
    peer.send(":carol!c@elsewhere QUIT :gone").await;
    peer.sync("renamed").await;
    assert!(channel.in_channel("alicia"));
    assert!(!channel.in_channel("alice"));
    assert!(!channel.in_channel("carol"));

    peer.send(":alicia!a@elsewhere PRIVMSG bot_ :\u{1}VERSION\u{1}").await;
    peer.expect("NOTICE alicia :\u{1}VERSION slirc-test 1.0\u{1}").await;
    peer.send(":alicia!a@elsewhere PRIVMSG bot_ :\u{1}PING\u{1}").await;
    peer.send(":alicia!a@elsewhere PRIVMSG bot_ :\u{1}PING 42\u{1}").await;
    peer.expect("NOTICE alicia :\u{1}PING 42\u{1}").await;

    peer.send(":srv.test KICK #test bot_ :out").await;
    peer.sync("kicked").await;
    assert!(client.find_channel(&server, "#test").is_none());

    client.exit("bye").await;
    peer.expect("QUIT :bye").await;
    assert!(!runner.await.unwrap());
}

#[tokio::test]
async fn peer_disconnect_ends_start() {
    let ircd = ScriptedServer::bind().await;
    let server = Server::new("127.0.0.1", ircd.port(), "bot", false);
    let client = Client::new(vec![server], options()).unwrap();
    let runner = tokio::spawn({
        let client = client.clone();
        async move { client.start().await }
    });

    let mut peer = ircd.accept().await;
    peer.register("bot").await;
    peer.sync("up").await;
    drop(peer);

    let restart = tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .unwrap()
        .unwrap();
    assert!(!restart);
    assert!(client.manager().connections().is_empty());
}

#[tokio::test]
async fn restart_is_reported() {
    let ircd = ScriptedServer::bind().await;
    let server = Server::new("127.0.0.1", ircd.port(), "bot", false);
    let client = Client::new(vec![server], options()).unwrap();
    let runner = tokio::spawn({
        let client = client.clone();
        async move { client.start().await }
    });

    let mut peer = ircd.accept().await;
    peer.register("bot").await;
    peer.sync("up").await;

    client.restart().await;
    peer.expect("QUIT :Restarting!").await;
    assert!(runner.await.unwrap());
}

#[tokio::test]
async fn ping_timeout_error_reconnects() {
    let ircd = ScriptedServer::bind().await;
    let server = Server::new("127.0.0.1", ircd.port(), "bot", false);
    let client = Client::new(vec![server], options()).unwrap();
    let runner = tokio::spawn({
        let client = client.clone();
        async move { client.start().await }
    });

    let mut peer = ircd.accept().await;
    peer.register("bot").await;
    peer.sync("up").await;
    peer.send("ERROR :Closing Link: bot (Ping timeout: 240 seconds)").await;
    drop(peer);

    let mut again = ircd.accept().await;
    again.register("bot").await;
    again.sync("back").await;

    client.exit("bye").await;
    again.expect("QUIT :bye").await;
    assert!(!tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .unwrap()
        .unwrap());
}

#[tokio::test]
async fn other_errors_do_not_reconnect() {
    let ircd = ScriptedServer::bind().await;
    let server = Server::new("127.0.0.1", ircd.port(), "bot", false);
    let client = Client::new(vec![server], options()).unwrap();
    let runner = tokio::spawn({
        let client = client.clone();
        async move { client.start().await }
    });

    let mut peer = ircd.accept().await;
    peer.register("bot").await;
    peer.sync("up").await;
    peer.send("ERROR :Closing Link: bot (K-Lined)").await;
    drop(peer);

    let restart = tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .unwrap()
        .unwrap();
    assert!(!restart);
    assert!(ircd.accept_within(Duration::from_millis(200)).await.is_none());
}

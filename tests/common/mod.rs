//! A scripted IRC server for end-to-end tests.

#![allow(dead_code)]

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;

const STEP: Duration = Duration::from_secs(5);

pub struct ScriptedServer {
    listener: TcpListener,
}

pub struct Peer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl ScriptedServer {
    pub async fn bind() -> Self {
        Self {
            listener: TcpListener::bind("127.0.0.1:0").await.unwrap(),
        }
    }

    pub fn port(&self) -> u16 {
        self.listener.local_addr().unwrap().port()
    }

    pub async fn accept(&self) -> Peer {
        self.accept_within(STEP).await.expect("client never connected")
    }

    /// The next client to connect within `wait`, if any.
    pub async fn accept_within(&self, wait: Duration) -> Option<Peer> {
        let (socket, _) = tokio::time::timeout(wait, self.listener.accept())
            .await
            .ok()?
            .unwrap();
        let (read, writer) = socket.into_split();
        Some(Peer {
            lines: BufReader::new(read).lines(),
            writer,
        })
    }
}

impl Peer {
    /// Next line from the client, without CRLF.
    pub async fn recv(&mut self) -> Option<String> {
        tokio::time::timeout(STEP, self.lines.next_line())
            .await
            .expect("timed out waiting for the client")
            .unwrap()
    }

    pub async fn expect(&mut self, line: &str) {
        assert_eq!(self.recv().await.as_deref(), Some(line));
    }

    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\r\n").as_bytes())
            .await
            .unwrap();
    }

    /// Greet as `srv.test`, then accept registration under `nick`.
    pub async fn register(&mut self, nick: &str) {
        self.expect(&format!("NICK {nick}")).await;
        self.expect(&format!("USER {nick} 0 * :{nick}")).await;
        self.send(":srv.test NOTICE * :*** Looking up your hostname").await;
        self.send(&format!(":srv.test 001 {nick} :Welcome to the test network")).await;
    }

    /// Round-trip a PING so everything sent before it has been handled.
    pub async fn sync(&mut self, token: &str) {
        self.send(&format!("PING :{token}")).await;
        self.expect(&format!("PONG srv.test :{token}")).await;
    }
}

//! One socket to one server.
//!
//! A [`Connection`] owns the write half of its socket and the buffer of the
//! last incomplete line. The read half is handed to the
//! [`ConnectionManager`], whose reader task reports readiness; the manager
//! then feeds the data back through [`Connection::process`], which splits it
//! into lines, parses each and dispatches the resulting events in order.

mod manager;
#[cfg(feature = "tls")]
mod tls;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::dispatch::Dispatch;
use crate::encode::Outbound;
use crate::error::{ProtocolError, Result};
use crate::event::EventKind;
use crate::line::parse_line;
use crate::state::Server;

pub use self::manager::ConnectionManager;

/// Bytes requested per socket read.
pub const READ_CHUNK: usize = 4096;

/// An unterminated fragment longer than this is discarded.
pub const MAX_LINE_LEN: usize = 8191;

/// QUIT message used when the peer drops the connection.
pub const RESET_MESSAGE: &str = "Connection reset by peer";

pub(crate) type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Process-unique connection identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ConnectionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Lifecycle of a connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    /// Socket open, registration in progress.
    Connected,
    /// The server sent its welcome reply.
    Welcomed,
}

/// What a reader task observed on the socket.
#[derive(Debug)]
pub enum Inbound {
    Data(Bytes),
    /// The peer closed the stream.
    Closed,
    Failed(std::io::Error),
}

/// A connection to one server.
pub struct Connection {
    id: ConnectionId,
    server: Arc<Server>,
    state: Mutex<ConnectionState>,
    reader: Mutex<Option<BoxedReader>>,
    writer: AsyncMutex<Option<BoxedWriter>>,
    partial: Mutex<LineBuffer>,
    closed: CancellationToken,
    #[cfg(feature = "tls")]
    tls: Option<tokio_rustls::TlsConnector>,
}

impl Connection {
    /// Create a disconnected connection for `server`.
    ///
    /// Fails with [`ProtocolError::TlsUnavailable`] if the server asks for
    /// TLS and this build has no TLS support.
    pub fn new(server: Arc<Server>) -> Result<Self> {
        check_tls_support(&server)?;
        Ok(Self {
            id: ConnectionId::next(),
            #[cfg(feature = "tls")]
            tls: server.use_tls().then(tls::connector),
            server,
            state: Mutex::new(ConnectionState::Disconnected),
            reader: Mutex::new(None),
            writer: AsyncMutex::new(None),
            partial: Mutex::new(LineBuffer::with_capacity(READ_CHUNK)),
            closed: CancellationToken::new(),
        })
    }

    /// Wrap an already-open stream. The connection starts out `Connected`.
    pub fn from_stream<S>(server: Arc<Server>, stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            id: ConnectionId::next(),
            server,
            state: Mutex::new(ConnectionState::Connected),
            reader: Mutex::new(Some(Box::new(reader))),
            writer: AsyncMutex::new(Some(Box::new(writer))),
            partial: Mutex::new(LineBuffer::with_capacity(READ_CHUNK)),
            closed: CancellationToken::new(),
            #[cfg(feature = "tls")]
            tls: None,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn server(&self) -> &Arc<Server> {
        &self.server
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// True while the socket is open, welcomed or not.
    pub fn is_connected(&self) -> bool {
        matches!(
            self.state(),
            ConnectionState::Connected | ConnectionState::Welcomed
        )
    }

    pub(crate) fn set_welcomed(&self) {
        let mut state = self.state.lock();
        if *state == ConnectionState::Connected {
            *state = ConnectionState::Welcomed;
        }
    }

    /// Open the socket, and the TLS session if the server wants one.
    ///
    /// Returns false on failure; the error is logged, never raised.
    pub async fn connect(&self) -> bool {
        *self.state.lock() = ConnectionState::Connecting;
        info!(
            connection = %self.id,
            server = %self.server,
            tls = self.server.use_tls(),
            "connecting"
        );

        match self.open().await {
            Ok(()) => {
                *self.state.lock() = ConnectionState::Connected;
                info!(connection = %self.id, server = %self.server, "connected");
                true
            }
            Err(e) => {
                *self.state.lock() = ConnectionState::Disconnected;
                error!(connection = %self.id, server = %self.server, error = %e, "connect failed");
                false
            }
        }
    }

    async fn open(&self) -> Result<()> {
        let stream = TcpStream::connect(self.server.address()).await?;
        if let Err(e) = enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }

        #[cfg(feature = "tls")]
        if let Some(connector) = &self.tls {
            let stream = tls::handshake(connector, self.server.host(), stream).await?;
            self.attach(stream).await;
            return Ok(());
        }

        self.attach(stream).await;
        Ok(())
    }

    async fn attach<S>(&self, stream: S)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        *self.reader.lock() = Some(Box::new(reader));
        *self.writer.lock().await = Some(Box::new(writer));
        self.partial.lock().clear();
    }

    pub(crate) fn take_reader(&self) -> Option<BoxedReader> {
        self.reader.lock().take()
    }

    /// Cancelled once the connection is torn down.
    pub(crate) fn closed(&self) -> CancellationToken {
        self.closed.clone()
    }

    /// Write one line, appending CRLF.
    ///
    /// A write failure is logged and returned; the connection stays
    /// registered until the reader notices the broken socket.
    pub async fn send(&self, line: &str) -> Result<()> {
        let mut writer = self.writer.lock().await;
        let Some(w) = writer.as_mut() else {
            return Err(ProtocolError::NotConnected);
        };

        let mut buf = Vec::with_capacity(line.len() + 2);
        buf.extend_from_slice(line.as_bytes());
        buf.extend_from_slice(b"\r\n");

        let written = async {
            w.write_all(&buf).await?;
            w.flush().await
        }
        .await;

        match written {
            Ok(()) => {
                trace!(connection = %self.id, ">> {}", line);
                Ok(())
            }
            Err(e) => {
                error!(connection = %self.id, server = %self.server, error = %e, "write failed");
                Err(e.into())
            }
        }
    }

    /// Send an [`Outbound`] command.
    pub async fn send_command(&self, command: &Outbound) -> Result<()> {
        self.send(&command.to_string()).await
    }

    /// Send QUIT (best effort), then close the socket.
    ///
    /// An empty message sends a bare `QUIT`. Calling this on a closed
    /// connection does nothing harmful.
    pub async fn disconnect(&self, message: &str) {
        let mut writer = self.writer.lock().await;
        if let Some(mut w) = writer.take() {
            let quit = Outbound::Quit((!message.is_empty()).then(|| message.to_string()));
            let line = format!("{}\r\n", quit);
            if let Err(e) = w.write_all(line.as_bytes()).await {
                debug!(connection = %self.id, error = %e, "QUIT not delivered");
            }
            if let Err(e) = w.shutdown().await {
                debug!(connection = %self.id, error = %e, "socket shutdown failed");
            }
            info!(connection = %self.id, server = %self.server, "disconnected");
        }
        drop(writer);

        self.reader.lock().take();
        *self.state.lock() = ConnectionState::Disconnected;
        self.closed.cancel();
    }

    /// Handle what the reader observed: split data into lines and dispatch
    /// each parsed event, or tear down on EOF and read errors.
    pub async fn process(self: &Arc<Self>, inbound: Inbound, dispatcher: &dyn Dispatch) {
        let chunk = match inbound {
            Inbound::Data(chunk) => chunk,
            Inbound::Closed => {
                error!(
                    connection = %self.id,
                    server = %self.server,
                    "no data received, peer closed the connection"
                );
                self.disconnect(RESET_MESSAGE).await;
                return;
            }
            Inbound::Failed(e) => {
                error!(connection = %self.id, server = %self.server, error = %e, "read failed");
                self.disconnect(RESET_MESSAGE).await;
                return;
            }
        };

        let lines = self.partial.lock().push(&chunk);

        for line in lines {
            match parse_line(&self.server, &line) {
                Ok(event) => {
                    if event.kind != EventKind::Pong {
                        debug!(connection = %self.id, "<< {}", String::from_utf8_lossy(&line));
                    }
                    if let EventKind::Numeric(reply) = &event.kind {
                        if reply.is_error() {
                            warn!(
                                connection = %self.id,
                                numeric = reply.name(),
                                message = event.message.as_deref().unwrap_or_default(),
                                "error reply"
                            );
                        }
                    }
                    dispatcher.dispatch(self, event).await;
                }
                Err(e) => {
                    warn!(connection = %self.id, error = %e, "dropping undecodable line");
                }
            }
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("server", &self.server.address())
            .field("state", &self.state())
            .finish()
    }
}

/// Reject TLS servers when TLS support is compiled out.
pub fn check_tls_support(server: &Server) -> Result<()> {
    if server.use_tls() && !cfg!(feature = "tls") {
        return Err(ProtocolError::TlsUnavailable {
            host: server.host().to_string(),
        });
    }
    Ok(())
}

fn enable_keepalive(stream: &TcpStream) -> std::io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let sock = SockRef::from(stream);
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));

    sock.set_tcp_keepalive(&keepalive)
}

/// Reassembles lines from a byte stream.
///
/// Lines are trimmed of surrounding whitespace (CR included); blank lines
/// are dropped. An unterminated fragment longer than [`MAX_LINE_LEN`] is
/// thrown away along with everything up to its eventual newline.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buf: BytesMut,
    discarding: bool,
}

impl LineBuffer {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            discarding: false,
        }
    }

    /// Append `chunk` and take every complete line out, leaving the
    /// trailing fragment buffered.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<Bytes> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();

        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line = self.buf.split_to(pos + 1).freeze();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            let trimmed = trim(&line);
            if !trimmed.is_empty() {
                lines.push(line.slice_ref(trimmed));
            }
        }

        if self.buf.len() > MAX_LINE_LEN {
            if !self.discarding {
                warn!(len = self.buf.len(), "discarding oversized unterminated line");
            }
            self.buf.clear();
            self.discarding = true;
        }

        lines
    }

    pub(crate) fn clear(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }

    pub(crate) fn pending(&self) -> &[u8] {
        &self.buf
    }
}

fn trim(line: &[u8]) -> &[u8] {
    let start = line
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(line.len());
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &line[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines_of(buf: &mut LineBuffer, chunk: &[u8]) -> Vec<String> {
        buf.push(chunk)
            .into_iter()
            .map(|b| String::from_utf8(b.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn test_split_keeps_fragment() {
        let mut buf = LineBuffer::default();
        assert_eq!(lines_of(&mut buf, b"PING :a\r\n:x PRIVMSG #c :hel"), vec!["PING :a"]);
        assert_eq!(buf.pending(), b":x PRIVMSG #c :hel");

        assert_eq!(lines_of(&mut buf, b"lo\r\n"), vec![":x PRIVMSG #c :hello"]);
        assert!(buf.pending().is_empty());
    }

    #[test]
    fn test_split_skips_blank_lines() {
        let mut buf = LineBuffer::default();
        assert_eq!(lines_of(&mut buf, b"\r\n  \nPING :a\n\n"), vec!["PING :a"]);
    }

    #[test]
    fn test_oversized_line_is_dropped_to_its_end() {
        let mut buf = LineBuffer::default();
        assert!(buf.push(&vec![b'a'; MAX_LINE_LEN + 1]).is_empty());
        assert!(buf.pending().is_empty());

        // still inside the same line
        assert!(buf.push(&vec![b'b'; MAX_LINE_LEN + 1]).is_empty());
        assert!(lines_of(&mut buf, b"PRIVMSG #c :tail").is_empty());

        assert_eq!(lines_of(&mut buf, b"\r\nPING :next\r\n"), vec!["PING :next"]);
    }

    #[tokio::test]
    async fn test_send_appends_crlf() {
        use tokio::io::AsyncReadExt;

        let (client, mut server) = tokio::io::duplex(256);
        let conn = Connection::from_stream(
            Arc::new(Server::new("irc.example.net", 6667, "bot", false)),
            client,
        );
        conn.send("NICK bot").await.unwrap();
        conn.disconnect("Bye!").await;

        let mut received = String::new();
        server.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "NICK bot\r\nQUIT :Bye!\r\n");
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(matches!(conn.send("PING :x").await, Err(ProtocolError::NotConnected)));

        // a second disconnect is harmless
        conn.disconnect("again").await;
    }

    #[cfg(not(feature = "tls"))]
    #[test]
    fn test_tls_unavailable() {
        let server = Arc::new(Server::new("irc.example.net", 6697, "bot", true));
        assert!(matches!(
            Connection::new(server),
            Err(ProtocolError::TlsUnavailable { .. })
        ));
    }
}

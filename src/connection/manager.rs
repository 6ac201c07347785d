//! Readiness multiplexing across every live connection.
//!
//! Each registered connection gets a reader task that forwards whatever it
//! reads to a shared channel. [`ConnectionManager::process`] waits on that
//! channel with a timeout and hands each item back to its connection, so
//! every line is parsed and dispatched from the caller's loop, in order.
//!
//! Bookkeeping is a map from connection id to the connection plus a guard.
//! Processing holds the guard and re-checks registration first, and
//! [`ConnectionManager::disconnect`] removes the entry before taking the
//! guard. Once disconnect returns, nothing more is dispatched for that
//! connection.
//!
//! A handler must not disconnect the connection it is being called for
//! inline: the guard is held for the whole dispatch. Spawn the call instead,
//! as the worker pool does.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tokio::io::AsyncReadExt;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{BoxedReader, Connection, ConnectionId, Inbound, READ_CHUNK};
use crate::dispatch::Dispatch;
use crate::event::{Event, EventKind};
use crate::state::Server;

const READY_QUEUE: usize = 256;

struct Readiness {
    id: ConnectionId,
    inbound: Inbound,
}

struct Entry {
    connection: Arc<Connection>,
    guard: Arc<AsyncMutex<()>>,
}

/// The set of live connections.
pub struct ConnectionManager {
    entries: Mutex<HashMap<ConnectionId, Entry>>,
    ready_tx: mpsc::Sender<Readiness>,
    ready_rx: AsyncMutex<mpsc::Receiver<Readiness>>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        let (ready_tx, ready_rx) = mpsc::channel(READY_QUEUE);
        Self {
            entries: Mutex::new(HashMap::new()),
            ready_tx,
            ready_rx: AsyncMutex::new(ready_rx),
        }
    }

    /// Start polling a connected connection and dispatch its CONNECT event.
    ///
    /// Returns false if the connection has no open socket.
    pub async fn register(&self, connection: Arc<Connection>, dispatcher: &dyn Dispatch) -> bool {
        let Some(reader) = connection.take_reader() else {
            warn!(connection = %connection.id(), "refusing to register a closed connection");
            return false;
        };

        let id = connection.id();
        let guard = Arc::new(AsyncMutex::new(()));
        let held = Arc::clone(&guard).lock_owned().await;

        self.entries.lock().insert(
            id,
            Entry {
                connection: Arc::clone(&connection),
                guard,
            },
        );
        tokio::spawn(pump(id, reader, connection.closed(), self.ready_tx.clone()));
        debug!(connection = %id, server = %connection.server(), "registered");

        dispatcher
            .dispatch(&connection, Event::new(EventKind::Connect))
            .await;
        drop(held);
        true
    }

    /// Wait up to `timeout` for readable connections and process them.
    ///
    /// With nothing registered this just sleeps for `timeout`. Connections
    /// that hit EOF or a read error are disconnected and dropped from the
    /// set here.
    pub async fn process(&self, timeout: Duration, dispatcher: &dyn Dispatch) {
        if !self.running() {
            tokio::time::sleep(timeout).await;
            return;
        }

        let batch = {
            let mut rx = self.ready_rx.lock().await;
            let first = match tokio::time::timeout(timeout, rx.recv()).await {
                Ok(Some(first)) => first,
                Ok(None) | Err(_) => return,
            };
            let mut batch = vec![first];
            while let Ok(next) = rx.try_recv() {
                batch.push(next);
            }
            batch
        };

        for Readiness { id, inbound } in batch {
            let Some((connection, guard)) = self.lookup(id) else {
                continue;
            };
            let _held = guard.lock().await;
            if !self.entries.lock().contains_key(&id) {
                continue;
            }

            connection.process(inbound, dispatcher).await;
            if !connection.is_connected() {
                self.entries.lock().remove(&id);
                debug!(connection = %id, "dropped from poll set");
            }
        }
    }

    /// Remove `connection` from the poll set, then close it.
    pub async fn disconnect(&self, connection: &Arc<Connection>, message: &str) {
        let entry = self.entries.lock().remove(&connection.id());
        match entry {
            Some(entry) => {
                let _held = entry.guard.lock().await;
                connection.disconnect(message).await;
            }
            None => connection.disconnect(message).await,
        }
    }

    /// Disconnect everything.
    pub async fn exit(&self, message: &str) {
        for connection in self.connections() {
            self.disconnect(&connection, message).await;
        }
    }

    /// True while at least one connection is registered.
    pub fn running(&self) -> bool {
        !self.entries.lock().is_empty()
    }

    /// Snapshot of the registered connections.
    pub fn connections(&self) -> Vec<Arc<Connection>> {
        let mut connections: Vec<_> = self
            .entries
            .lock()
            .values()
            .map(|e| Arc::clone(&e.connection))
            .collect();
        connections.sort_by_key(|c| c.id());
        connections
    }

    /// The registered connection for a server with the same host and port.
    pub fn find(&self, server: &Server) -> Option<Arc<Connection>> {
        self.connections().into_iter().find(|c| {
            c.server().host() == server.host() && c.server().port() == server.port()
        })
    }

    fn lookup(&self, id: ConnectionId) -> Option<(Arc<Connection>, Arc<AsyncMutex<()>>)> {
        self.entries
            .lock()
            .get(&id)
            .map(|e| (Arc::clone(&e.connection), Arc::clone(&e.guard)))
    }
}

/// Forward socket reads to the readiness queue until EOF, error or close.
async fn pump(
    id: ConnectionId,
    mut reader: BoxedReader,
    closed: CancellationToken,
    ready: mpsc::Sender<Readiness>,
) {
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let inbound = tokio::select! {
            _ = closed.cancelled() => return,
            read = reader.read(&mut buf) => match read {
                Ok(0) => Inbound::Closed,
                Ok(n) => Inbound::Data(Bytes::copy_from_slice(&buf[..n])),
                Err(e) => Inbound::Failed(e),
            },
        };
        let last = !matches!(inbound, Inbound::Data(_));

        tokio::select! {
            _ = closed.cancelled() => return,
            sent = ready.send(Readiness { id, inbound }) => {
                if sent.is_err() || last {
                    return;
                }
            }
        }
    }
}

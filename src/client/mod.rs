//! The client façade.
//!
//! [`Client`] owns the servers, the session state, the connection manager
//! and the plugin registries. [`Client::start`] connects to every configured
//! server and drives the poll loop until nothing is left to poll; the
//! outbound actions (`join`, `privmsg`, ...) are what plugins call to talk
//! back.

pub(crate) mod handlers;
pub mod ctcp;
pub mod registration;
pub mod workers;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::bot::CommandRegistry;
use crate::connection::{check_tls_support, Connection, ConnectionManager};
use crate::dispatch::{Dispatch, EventDispatcher};
use crate::encode::Outbound;
use crate::error::{ClientError, Result};
use crate::event::Event;
use crate::state::{Channel, Server, Session};

pub use self::workers::WorkerPool;

/// QUIT message used by [`Client::restart`].
pub const RESTART_MESSAGE: &str = "Restarting!";

/// Tunables for a [`Client`].
#[derive(Clone, Debug)]
pub struct ClientOptions {
    /// Reply to CTCP VERSION and the `version` command.
    pub version: String,
    /// How long one poll cycle waits for data.
    pub poll_timeout: Duration,
    /// Connect attempts per server before giving up.
    pub connect_attempts: u32,
    /// Pause between connect attempts.
    pub connect_retry: Duration,
    /// Plugin tasks allowed to run at once.
    pub max_workers: usize,
    /// How long [`Client::start`] waits for plugin tasks before cancelling them.
    pub shutdown_grace: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            version: format!("slirc-client {}", env!("CARGO_PKG_VERSION")),
            poll_timeout: Duration::from_millis(200),
            connect_attempts: 5,
            connect_retry: Duration::from_secs(30),
            max_workers: 32,
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

/// A multi-server IRC client. Cheap to clone; clones share everything.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    options: ClientOptions,
    servers: RwLock<Vec<Arc<Server>>>,
    session: Session,
    manager: ConnectionManager,
    dispatcher: EventDispatcher,
    commands: Arc<CommandRegistry>,
    workers: WorkerPool,
    restart: AtomicBool,
    pending: Arc<AtomicUsize>,
    stop: CancellationToken,
}

/// Counts a connect attempt as pending until dropped.
struct PendingConnect(Arc<AtomicUsize>);

impl PendingConnect {
    fn new(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        PendingConnect(Arc::clone(counter))
    }
}

impl Drop for PendingConnect {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Client {
    /// Create a client for `servers`.
    ///
    /// Fails if a server asks for TLS and this build has no TLS support.
    pub fn new(
        servers: Vec<Server>,
        options: ClientOptions,
    ) -> std::result::Result<Self, ClientError> {
        for server in &servers {
            check_tls_support(server)?;
        }
        let workers = WorkerPool::new(options.max_workers);
        Ok(Self {
            inner: Arc::new(Inner {
                options,
                servers: RwLock::new(servers.into_iter().map(Arc::new).collect()),
                session: Session::new(),
                manager: ConnectionManager::new(),
                dispatcher: EventDispatcher::new(),
                commands: Arc::new(CommandRegistry::new()),
                workers,
                restart: AtomicBool::new(false),
                pending: Arc::new(AtomicUsize::new(0)),
                stop: CancellationToken::new(),
            }),
        })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.inner.options
    }

    /// Event plugin registry.
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.inner.dispatcher
    }

    /// Command plugin registry used by the command router.
    pub fn commands(&self) -> &Arc<CommandRegistry> {
        &self.inner.commands
    }

    pub fn workers(&self) -> &WorkerPool {
        &self.inner.workers
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.inner.manager
    }

    /// The CTCP VERSION reply.
    pub fn version(&self) -> &str {
        &self.inner.options.version
    }

    pub fn servers(&self) -> Vec<Arc<Server>> {
        self.inner.servers.read().clone()
    }

    pub fn server_by_name(&self, name: &str) -> Option<Arc<Server>> {
        self.inner
            .servers
            .read()
            .iter()
            .find(|s| s.name() == name)
            .cloned()
    }

    /// The live connection to `server`, if any.
    pub fn find_connection(&self, server: &Server) -> Option<Arc<Connection>> {
        self.inner.manager.find(server)
    }

    pub fn find_channel(&self, server: &Arc<Server>, name: &str) -> Option<Arc<Channel>> {
        self.inner.session.find_channel(server, name)
    }

    pub fn server_channels(&self, server: &Arc<Server>) -> Vec<Arc<Channel>> {
        self.inner.session.server_channels(server)
    }

    /// Is `nick` an admin on `server`? Compared exactly.
    pub fn is_admin(&self, server: &Server, nick: &str) -> bool {
        server.is_admin(nick)
    }

    /// Connect to every server and poll until no connection is left.
    ///
    /// Pending connect attempts count as live. Returns true if
    /// [`restart`](Self::restart) was requested.
    pub async fn start(&self) -> bool {
        for server in self.servers() {
            self.spawn_connect(server);
        }

        let timeout = self.inner.options.poll_timeout;
        while self.inner.manager.running() || self.inner.pending.load(Ordering::SeqCst) > 0 {
            self.inner.manager.process(timeout, self).await;
        }

        info!("no connections left");
        self.inner
            .workers
            .shutdown(self.inner.options.shutdown_grace)
            .await;
        self.inner.restart.load(Ordering::SeqCst)
    }

    /// Add a server at runtime and start connecting to it.
    pub fn connect(
        &self,
        host: &str,
        port: u16,
        nick: &str,
        tls: bool,
    ) -> std::result::Result<Arc<Server>, ClientError> {
        let server = Server::new(host, port, nick, tls);
        check_tls_support(&server)?;
        let server = Arc::new(server);
        self.inner.servers.write().push(Arc::clone(&server));
        self.spawn_connect(Arc::clone(&server));
        Ok(server)
    }

    /// Connect to `server` again from scratch.
    pub(crate) fn reconnect(&self, server: Arc<Server>) {
        self.spawn_connect(server);
    }

    fn spawn_connect(&self, server: Arc<Server>) {
        let pending = PendingConnect::new(&self.inner.pending);
        let client = self.clone();
        self.inner.workers.spawn_background(async move {
            let _pending = pending;
            client.connect_with_retry(server).await;
        });
    }

    async fn connect_with_retry(&self, server: Arc<Server>) -> bool {
        server.reset();
        self.inner.session.clear_server(&server);

        let attempts = self.inner.options.connect_attempts.max(1);
        let retry = self.inner.options.connect_retry;
        for attempt in 1..=attempts {
            if self.inner.stop.is_cancelled() {
                return false;
            }
            let connection = match Connection::new(Arc::clone(&server)) {
                Ok(connection) => Arc::new(connection),
                Err(e) => {
                    error!(server = %server, error = %e, "cannot connect");
                    return false;
                }
            };

            if connection.connect().await {
                if self.inner.stop.is_cancelled() {
                    connection.disconnect("").await;
                    return false;
                }
                return self.inner.manager.register(connection, self).await;
            }

            if attempt < attempts {
                warn!(
                    server = %server,
                    attempt,
                    retry_secs = retry.as_secs(),
                    "connect failed, retrying"
                );
                tokio::select! {
                    _ = self.inner.stop.cancelled() => return false,
                    _ = tokio::time::sleep(retry) => {}
                }
            }
        }

        error!(server = %server, attempts, "giving up on server");
        false
    }

    pub async fn join<S: AsRef<str>>(&self, connection: &Connection, channels: &[S]) -> Result<()> {
        connection.send_command(&Outbound::join(channels)).await
    }

    /// JOIN a single keyed channel.
    pub async fn join_with_key(
        &self,
        connection: &Connection,
        channel: &str,
        key: &str,
    ) -> Result<()> {
        let join = Outbound::Join {
            channels: vec![channel.to_string()],
            keys: vec![key.to_string()],
        };
        connection.send_command(&join).await
    }

    pub async fn part<S: AsRef<str>>(&self, connection: &Connection, channels: &[S]) -> Result<()> {
        connection.send_command(&Outbound::part(channels)).await
    }

    /// Set modes on `target`, or query them when `modes` is `None`.
    pub async fn mode(
        &self,
        connection: &Connection,
        target: &str,
        modes: Option<&str>,
    ) -> Result<()> {
        let mode = Outbound::Mode {
            target: target.to_string(),
            modes: modes.map(str::to_string),
        };
        connection.send_command(&mode).await
    }

    pub async fn kick(
        &self,
        connection: &Connection,
        channel: &str,
        user: &str,
        reason: &str,
    ) -> Result<()> {
        let kick = Outbound::Kick {
            channel: channel.to_string(),
            user: user.to_string(),
            reason: reason.to_string(),
        };
        connection.send_command(&kick).await
    }

    pub async fn privmsg(&self, connection: &Connection, target: &str, text: &str) -> Result<()> {
        connection.send_command(&Outbound::privmsg(target, text)).await
    }

    pub async fn notice(&self, connection: &Connection, target: &str, text: &str) -> Result<()> {
        connection.send_command(&Outbound::notice(target, text)).await
    }

    /// Answer a CTCP request with `\x01COMMAND reply\x01` in a NOTICE.
    pub async fn ctcp_reply(
        &self,
        connection: &Connection,
        target: &str,
        command: &str,
        reply: &str,
    ) -> Result<()> {
        self.notice(connection, target, &ctcp::wrap(command, reply))
            .await
    }

    pub async fn nick(&self, connection: &Connection, nick: &str) -> Result<()> {
        connection
            .send_command(&Outbound::Nick(nick.to_string()))
            .await
    }

    /// Send a preformatted line.
    pub async fn raw(&self, connection: &Connection, line: &str) -> Result<()> {
        connection.send_command(&Outbound::Raw(line.to_string())).await
    }

    /// Leave one server. The connection is out of the poll set when this
    /// returns.
    pub async fn quit(&self, connection: &Arc<Connection>, message: &str) {
        self.inner.manager.disconnect(connection, message).await;
    }

    /// Leave every server and stop reconnecting; [`start`](Self::start)
    /// returns once the loop notices.
    pub async fn exit(&self, message: &str) {
        info!(message, "exiting");
        self.inner.stop.cancel();
        self.inner.manager.exit(message).await;
    }

    /// Exit, and have [`start`](Self::start) report that a restart was asked for.
    pub async fn restart(&self) {
        self.inner.restart.store(true, Ordering::SeqCst);
        self.exit(RESTART_MESSAGE).await;
    }
}

#[async_trait]
impl Dispatch for Client {
    async fn dispatch(&self, connection: &Arc<Connection>, event: Event) {
        self.inner.dispatcher.dispatch(self, connection, event).await;
    }
}

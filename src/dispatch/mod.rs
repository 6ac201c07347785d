//! Event routing.
//!
//! Every parsed event first goes to the client's own core hook for its kind
//! (state bookkeeping, PING replies, CTCP), then to the plugins registered
//! for that kind, in registration order. A core hook may consume the event,
//! in which case plugins never see it.
//!
//! Plugins for chat messages (`PRIVMSG` in both flavours) run on the
//! client's bounded worker pool so a slow plugin cannot stall the poll loop.
//! All other plugins run inline, in order with later lines from the same
//! connection.
//!
//! A handler that returns an error or panics is logged and skipped; the
//! remaining handlers still run.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use parking_lot::RwLock;
use tracing::{error, warn};

use crate::client::handlers::{CoreHook, Flow};
use crate::client::Client;
use crate::connection::Connection;
use crate::event::{Event, EventArgs, EventKind, Interest};

/// Something that consumes the events a connection produces.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch(&self, connection: &Arc<Connection>, event: Event);
}

/// What a plugin handler gets to work with.
#[derive(Clone)]
pub struct HandlerContext {
    pub client: Client,
    /// The connection the event arrived on. Replies go here.
    pub connection: Arc<Connection>,
}

/// A plugin reacting to one or more event kinds.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs and for unregistering.
    fn name(&self) -> &str;

    /// Event fields this handler reads. Undeclared fields arrive empty.
    fn interest(&self) -> Interest {
        Interest::ALL
    }

    async fn handle(&self, ctx: &HandlerContext, args: EventArgs) -> anyhow::Result<()>;
}

/// Plugin registry keyed by event kind.
#[derive(Default)]
pub struct EventDispatcher {
    plugins: RwLock<HashMap<EventKind, Vec<Arc<dyn EventHandler>>>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin for `kind`, after any already registered.
    pub fn register(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        self.plugins.write().entry(kind).or_default().push(handler);
    }

    /// Remove the plugin called `name` from `kind`.
    pub fn unregister(&self, kind: &EventKind, name: &str) -> bool {
        let mut plugins = self.plugins.write();
        let Some(handlers) = plugins.get_mut(kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|h| h.name() != name);
        handlers.len() != before
    }

    /// Snapshot of the plugins for `kind`.
    pub fn handlers(&self, kind: &EventKind) -> Vec<Arc<dyn EventHandler>> {
        self.plugins.read().get(kind).cloned().unwrap_or_default()
    }

    /// Run the core hook, then the plugins, for one event.
    pub async fn dispatch(&self, client: &Client, connection: &Arc<Connection>, event: Event) {
        if let Some(hook) = CoreHook::for_kind(&event.kind) {
            let args = hook.interest().project(&event);
            let outcome = AssertUnwindSafe(client.run_core(hook, connection, args))
                .catch_unwind()
                .await;
            match outcome {
                Ok(Ok(Flow::Consumed)) => return,
                Ok(Ok(Flow::Continue)) => {}
                Ok(Err(e)) => warn!(event = %event.kind, error = %e, "core handler failed"),
                Err(_) => error!(event = %event.kind, "core handler panicked"),
            }
        }

        let handlers = self.handlers(&event.kind);
        if handlers.is_empty() {
            return;
        }

        let ctx = HandlerContext {
            client: client.clone(),
            connection: Arc::clone(connection),
        };
        if event.kind.is_application_message() {
            client.workers().spawn(async move {
                run_handlers(&ctx, &handlers, &event).await;
            });
        } else {
            run_handlers(&ctx, &handlers, &event).await;
        }
    }
}

async fn run_handlers(ctx: &HandlerContext, handlers: &[Arc<dyn EventHandler>], event: &Event) {
    for handler in handlers {
        let args = handler.interest().project(event);
        match AssertUnwindSafe(handler.handle(ctx, args)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(handler = handler.name(), event = %event.kind, error = %e, "handler failed")
            }
            Err(_) => error!(handler = handler.name(), event = %event.kind, "handler panicked"),
        }
    }
}

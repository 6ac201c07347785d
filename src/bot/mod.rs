//! Bot commands on top of the client.
//!
//! A chat line that starts with the configured prefix is split into a
//! command and its arguments and routed to a [`CommandHandler`]. Routes live
//! in three scopes: [`Scope::Both`] is searched first, then the scope that
//! matches how the line arrived (in a channel or privately). The first route
//! listing the command wins.
//!
//! [`CommandRouter`] is the [`EventHandler`] that does this; [`build_client`]
//! wires a [`Config`] and a [`PluginCatalog`] into a ready [`Client`].

pub mod builtin;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::config::Config;
use crate::dispatch::{EventHandler, HandlerContext};
use crate::error::ClientError;
use crate::event::{EventArgs, EventKind, Interest, Source};
use crate::state::User;

/// Where a command route applies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Channel and private messages.
    #[default]
    Both,
    /// Channel messages only.
    Public,
    /// Private messages only.
    Private,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::Both => "both",
            Scope::Public => "public",
            Scope::Private => "private",
        })
    }
}

/// How a [`Reply`] is sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyAction {
    Privmsg,
    Notice,
}

/// Lines a command wants sent back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub action: ReplyAction,
    pub target: String,
    pub lines: Vec<String>,
}

impl Reply {
    pub fn privmsg(target: &str, lines: Vec<String>) -> Self {
        Self {
            action: ReplyAction::Privmsg,
            target: target.to_string(),
            lines,
        }
    }

    pub fn notice(target: &str, lines: Vec<String>) -> Self {
        Self {
            action: ReplyAction::Notice,
            target: target.to_string(),
            lines,
        }
    }
}

/// One command line as a handler sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Who typed the command.
    pub source: User,
    /// Where replies should go: the channel for public lines, the sender's
    /// nick for private ones.
    pub reply_to: String,
    /// The line was sent to a channel.
    pub public: bool,
    pub command: String,
    pub args: Vec<String>,
}

/// A command plugin.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Plugin name, listed by the `commands` built-in.
    fn name(&self) -> &str;

    /// Only server admins may run it. Admin commands are also left out of
    /// the `commands` listing.
    fn admin_only(&self) -> bool {
        false
    }

    async fn execute(
        &self,
        ctx: &HandlerContext,
        invocation: &Invocation,
    ) -> anyhow::Result<Option<Reply>>;
}

struct Route {
    commands: Vec<String>,
    handler: Arc<dyn CommandHandler>,
}

impl Route {
    fn matches(&self, command: &str) -> bool {
        self.commands.iter().any(|c| c.eq_ignore_ascii_case(command))
    }
}

/// Command routing table.
#[derive(Default)]
pub struct CommandRegistry {
    routes: RwLock<HashMap<Scope, Vec<Route>>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `commands` in `scope` to `handler`, after existing routes.
    pub fn add(&self, scope: Scope, commands: Vec<String>, handler: Arc<dyn CommandHandler>) {
        self.routes
            .write()
            .entry(scope)
            .or_default()
            .push(Route { commands, handler });
    }

    /// Route a single command in [`Scope::Both`]. Fails if that scope
    /// already routes the name.
    pub fn register_command(&self, command: &str, handler: Arc<dyn CommandHandler>) -> bool {
        let mut routes = self.routes.write();
        let both = routes.entry(Scope::Both).or_default();
        if both.iter().any(|r| r.matches(command)) {
            return false;
        }
        both.push(Route {
            commands: vec![command.to_string()],
            handler,
        });
        true
    }

    /// Remove the [`Scope::Both`] route that lists exactly `command`.
    pub fn unregister_command(&self, command: &str) -> bool {
        let mut routes = self.routes.write();
        let Some(both) = routes.get_mut(&Scope::Both) else {
            return false;
        };
        match both
            .iter()
            .position(|r| r.commands.len() == 1 && r.matches(command))
        {
            Some(index) => {
                both.remove(index);
                true
            }
            None => false,
        }
    }

    /// The handler for `command`, searching [`Scope::Both`] first.
    pub fn lookup(&self, command: &str, public: bool) -> Option<Arc<dyn CommandHandler>> {
        let scope = if public { Scope::Public } else { Scope::Private };
        let routes = self.routes.read();
        [Scope::Both, scope]
            .iter()
            .filter_map(|s| routes.get(s))
            .flatten()
            .find(|r| r.matches(command))
            .map(|r| Arc::clone(&r.handler))
    }

    /// Names of the non-admin plugins, sorted, each once.
    pub fn plugin_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .routes
            .read()
            .values()
            .flatten()
            .filter(|r| !r.handler.admin_only())
            .map(|r| r.handler.name().to_string())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Split a prefixed line into command and arguments.
///
/// `None` unless the line starts with `prefix` and names a command. A
/// prefix directly followed by a space yields the command `" "`.
pub fn tokenize(message: &str, prefix: &str) -> Option<(String, Vec<String>)> {
    if prefix.is_empty() {
        return None;
    }
    let rest = message.strip_prefix(prefix)?;
    if let Some(args) = rest.strip_prefix(' ') {
        return Some((" ".to_string(), args.split_whitespace().map(str::to_string).collect()));
    }
    let mut tokens = rest.split_whitespace();
    let command = tokens.next()?.to_string();
    Some((command, tokens.map(str::to_string).collect()))
}

/// Routes prefixed chat lines to command plugins.
pub struct CommandRouter {
    prefix: String,
}

impl CommandRouter {
    pub const NAME: &'static str = "command-router";

    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    async fn send_reply(ctx: &HandlerContext, reply: &Reply) {
        for line in &reply.lines {
            let sent = match reply.action {
                ReplyAction::Privmsg => {
                    ctx.client
                        .privmsg(&ctx.connection, &reply.target, line)
                        .await
                }
                ReplyAction::Notice => {
                    ctx.client.notice(&ctx.connection, &reply.target, line).await
                }
            };
            if let Err(e) = sent {
                warn!(target = %reply.target, error = %e, "failed to send reply line");
            }
        }
    }
}

#[async_trait]
impl EventHandler for CommandRouter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn interest(&self) -> Interest {
        Interest::NONE.source().target().message()
    }

    async fn handle(&self, ctx: &HandlerContext, args: EventArgs) -> anyhow::Result<()> {
        let Some((command, cmd_args)) = tokenize(args.message(), &self.prefix) else {
            return Ok(());
        };
        let Some(Source::User(source)) = args.source else {
            return Ok(());
        };

        let public = args.kind == EventKind::Pubmsg;
        let reply_to = match (&args.target, public) {
            (Some(target), true) => target.as_str().to_string(),
            _ => source.nick().to_string(),
        };

        let Some(handler) = ctx.client.commands().lookup(&command, public) else {
            return Ok(());
        };
        if handler.admin_only() && !ctx.client.is_admin(ctx.connection.server(), source.nick()) {
            debug!(command = %command, nick = source.nick(), "admin command refused");
            return Ok(());
        }

        let invocation = Invocation {
            source,
            reply_to,
            public,
            command,
            args: cmd_args,
        };
        if let Some(reply) = handler.execute(ctx, &invocation).await? {
            Self::send_reply(ctx, &reply).await;
        }
        Ok(())
    }
}

/// A plugin produced by a [`PluginCatalog`] factory.
#[derive(Clone)]
pub enum Plugin {
    Command(Arc<dyn CommandHandler>),
    Event(Arc<dyn EventHandler>),
}

type Factory = Box<dyn Fn() -> Plugin + Send + Sync>;

/// Plugins the configuration can refer to by name.
#[derive(Default)]
pub struct PluginCatalog {
    factories: HashMap<String, Factory>,
}

impl PluginCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// `version`, `commands` and `log`.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.register("version", || Plugin::Command(Arc::new(builtin::VersionCommand)));
        catalog.register("commands", || Plugin::Command(Arc::new(builtin::CommandsCommand)));
        catalog.register("log", || Plugin::Event(Arc::new(builtin::LogEvents)));
        catalog
    }

    /// Add or replace a factory.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Plugin + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    pub fn create(&self, name: &str) -> Option<Plugin> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

/// Build a client from configuration: servers, options, the command
/// routing table, the event plugins, and the router itself.
pub fn build_client(config: &Config, catalog: &PluginCatalog) -> Result<Client, ClientError> {
    let client = Client::new(config.servers(), config.client_options())?;

    for route in &config.command_plugins {
        match catalog.create(&route.plugin) {
            Some(Plugin::Command(handler)) => {
                client.commands().add(route.scope, route.commands.clone(), handler);
            }
            _ => return Err(ClientError::UnknownPlugin(route.plugin.clone())),
        }
    }

    for entry in &config.event_plugins {
        let kind: EventKind = entry.event.parse()?;
        for name in &entry.plugins {
            match catalog.create(name) {
                Some(Plugin::Event(handler)) => client.dispatcher().register(kind.clone(), handler),
                _ => return Err(ClientError::UnknownPlugin(name.clone())),
            }
        }
    }

    let router: Arc<dyn EventHandler> = Arc::new(CommandRouter::new(&config.command_prefix));
    client.dispatcher().register(EventKind::Pubmsg, Arc::clone(&router));
    client.dispatcher().register(EventKind::Privmsg, router);

    info!(
        servers = config.servers.len(),
        command_routes = config.command_plugins.len(),
        "client configured"
    );
    Ok(client)
}

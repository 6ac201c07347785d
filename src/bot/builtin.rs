//! Plugins every bot gets.

use async_trait::async_trait;
use tracing::info;

use super::{CommandHandler, Invocation, Reply};
use crate::dispatch::{EventHandler, HandlerContext};
use crate::event::EventArgs;

/// `version`: replies with the client's version string.
pub struct VersionCommand;

#[async_trait]
impl CommandHandler for VersionCommand {
    fn name(&self) -> &str {
        "version"
    }

    async fn execute(
        &self,
        ctx: &HandlerContext,
        invocation: &Invocation,
    ) -> anyhow::Result<Option<Reply>> {
        Ok(Some(Reply::privmsg(
            &invocation.reply_to,
            vec![ctx.client.version().to_string()],
        )))
    }
}

/// `commands`: lists the commands anyone may run.
pub struct CommandsCommand;

impl CommandsCommand {
    pub fn listing(names: &[String]) -> String {
        format!("Commands: {}", names.join(" "))
    }
}

#[async_trait]
impl CommandHandler for CommandsCommand {
    fn name(&self) -> &str {
        "commands"
    }

    async fn execute(
        &self,
        ctx: &HandlerContext,
        invocation: &Invocation,
    ) -> anyhow::Result<Option<Reply>> {
        let names = ctx.client.commands().plugin_names();
        Ok(Some(Reply::privmsg(&invocation.reply_to, vec![Self::listing(&names)])))
    }
}

/// `log`: logs each event it is registered for.
pub struct LogEvents;

#[async_trait]
impl EventHandler for LogEvents {
    fn name(&self) -> &str {
        "log"
    }

    async fn handle(&self, ctx: &HandlerContext, args: EventArgs) -> anyhow::Result<()> {
        info!(
            connection = %ctx.connection.id(),
            event = %args.kind,
            source = args.source_nick().unwrap_or_default(),
            target = args.target_str().unwrap_or_default(),
            message = args.message(),
            "event"
        );
        Ok(())
    }
}

//! slirc-bot: runs the configured bot until every connection is gone.
//!
//! Ctrl-C quits all servers with the configured quit message. A restart
//! requested by a plugin rebuilds the client from the same file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use slirc_client::bot::{build_client, PluginCatalog};
use slirc_client::config::Config;

#[derive(Parser)]
#[command(name = "slirc-bot", version, about = "Multi-server IRC bot")]
struct Args {
    /// Configuration file
    #[arg(long, short, env = "SLIRC_CONFIG", default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(true)
        .init();

    info!(path = %args.config.display(), servers = config.servers.len(), "starting slirc-bot");

    let catalog = PluginCatalog::builtin();
    let mut config = config;
    loop {
        let client = build_client(&config, &catalog)?;

        let on_signal = client.clone();
        let quit_message = config.quit_message.clone();
        let signal = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => on_signal.exit(&quit_message).await,
                Err(e) => error!(error = %e, "cannot listen for ctrl-c"),
            }
        });

        let restart = client.start().await;
        signal.abort();
        if !restart {
            break;
        }

        info!("restarting");
        config = match Config::load(&args.config) {
            Ok(reloaded) => reloaded,
            Err(e) => {
                error!(error = %e, "reload failed, keeping previous configuration");
                config
            }
        };
    }

    info!("stopped");
    Ok(())
}

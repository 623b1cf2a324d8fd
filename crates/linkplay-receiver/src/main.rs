//! LinkPlay Receiver.
//!
//! Thin wrapper around ffplay: listens for the sender's MPEG-TS stream on
//! `udp://@:5555` with buffering disabled, in a window whose fixed title
//! lets OBS capture it. Ctrl-C stops ffplay (politely, then by force after
//! one second).

use anyhow::Result;
use clap::Parser;
use linkplay_core::{launcher, TokioLauncher};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;
mod player;

use cli::Cli;
use player::Player;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("LinkPlay Receiver v{}", env!("CARGO_PKG_VERSION"));

    let config = Cli::parse().receiver_config();
    match Player::new(config, TokioLauncher).run(launcher::ctrl_c()).await {
        Ok(_) => Ok(()),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            Err(e.into())
        }
    }
}

//! LinkPlay Sender.
//!
//! Streams this machine's desktop to a LinkPlay receiver. All capture,
//! encoding and transport is done by FFmpeg, run as a child process:
//!
//! ```text
//! linkplay-sender                              receiver
//! ───────────────────────────────────          ─────────────────────
//! ffmpeg -encoders   (h264_nvenc present?)
//! ffmpeg gdigrab/x11grab → h264_nvenc
//!        → MPEG-TS ──── udp://<host>:5555 ───► ffplay udp://@:5555
//! ```
//!
//! Exit status is 0 once FFmpeg has exited (for any reason), 1 if the
//! encoder is missing, the host is invalid or FFmpeg cannot be started.

use anyhow::Result;
use clap::Parser;
use linkplay_core::{launcher, FfmpegEncoderProbe, TokioLauncher};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

mod cli;
mod sender;

use cli::Cli;
use sender::Sender;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("LinkPlay Sender v{}", env!("CARGO_PKG_VERSION"));

    match run(Cli::parse()).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            Err(e)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = cli.sender_config()?;
    match &cli.host {
        Some(_) => info!("Using target host from command line: {}", config.target.host),
        None => info!("Using default target host: {}", config.target.host),
    }

    let probe = FfmpegEncoderProbe::new(&config.toolkit);
    let mut sender = Sender::new(config, probe, TokioLauncher);
    let result = sender.run(launcher::ctrl_c()).await;
    debug!("Sender finished in state {:?}", sender.state());
    result?;
    Ok(())
}

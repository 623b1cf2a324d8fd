//! Runs ffplay against the LinkPlay UDP port and reports how it ended.

use std::fmt;

use linkplay_core::{
    build_play_command, CancelSignal, ChildExit, LaunchError, ProcessLauncher, ReceiverConfig,
    StopReason,
};
use tracing::{error, info};

/// How the player run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerOutcome {
    /// Exited by itself with this code.
    Finished(i32),
    /// Exited by itself without a code (killed by a signal).
    Crashed,
    /// We stopped it (Ctrl-C or timeout).
    Stopped,
}

impl From<ChildExit> for PlayerOutcome {
    fn from(exit: ChildExit) -> Self {
        match (exit.reason, exit.code()) {
            (StopReason::Cancelled | StopReason::TimedOut, _) => PlayerOutcome::Stopped,
            (StopReason::Exited, Some(code)) => PlayerOutcome::Finished(code),
            (StopReason::Exited, None) => PlayerOutcome::Crashed,
        }
    }
}

impl fmt::Display for PlayerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerOutcome::Finished(code) => write!(f, "finished (exit code {code})"),
            PlayerOutcome::Crashed        => f.write_str("crashed"),
            PlayerOutcome::Stopped        => f.write_str("stopped"),
        }
    }
}

// ── Player ────────────────────────────────────────────────────────────────────

pub struct Player<L> {
    config:   ReceiverConfig,
    launcher: L,
}

impl<L: ProcessLauncher> Player<L> {
    pub fn new(config: ReceiverConfig, launcher: L) -> Self {
        Self { config, launcher }
    }

    /// Start ffplay and wait for it. No restart once it has exited.
    pub async fn run(&self, cancel: CancelSignal) -> Result<PlayerOutcome, LaunchError> {
        let player = self.config.player.as_str();
        let command = build_play_command(&self.config);
        info!("Starting: {}", command);

        let mut child = self.launcher.spawn(&command).map_err(|e| {
            if e.is_not_found() {
                error!("'{}' not found in PATH. Install FFmpeg (e.g. `brew install ffmpeg`).", player);
            } else {
                error!("Failed to start '{}'. Is FFmpeg installed and in PATH? ({})", player, e);
            }
            e
        })?;

        info!(
            "{} running (pid {:?}). Waiting for stream on UDP port {}...",
            player,
            child.id(),
            self.config.port
        );

        let outcome = PlayerOutcome::from(child.wait(self.config.wait, cancel).await?);
        info!("{} {}.", player, outcome);
        Ok(outcome)
    }
}

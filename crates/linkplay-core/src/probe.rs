//! Hardware encoder capability probe.
//!
//! FFmpeg has no structured capability query, so [`FfmpegEncoderProbe`]
//! scrapes the text printed by `ffmpeg -hide_banner -encoders`:
//!
//! ```text
//!  V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)
//! ```
//!
//! Callers only see [`EncoderAvailabilityChecker`], so the scraping can be
//! replaced without touching the sender.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::command::{resolve_toolkit, ToolkitCommand};

#[async_trait]
pub trait EncoderAvailabilityChecker: Send + Sync {
    /// `true` only if `encoder` is positively known to be usable.
    async fn is_available(&self, encoder: &str) -> bool;
}

/// True if the encoder listing mentions `encoder`.
pub fn encoder_listed(listing: &str, encoder: &str) -> bool {
    !encoder.is_empty() && listing.contains(encoder)
}

// ── FfmpegEncoderProbe ────────────────────────────────────────────────────────

pub struct FfmpegEncoderProbe {
    command: ToolkitCommand,
}

impl FfmpegEncoderProbe {
    /// Probe through `toolkit -hide_banner -encoders`.
    pub fn new(toolkit: &str) -> Self {
        Self {
            command: ToolkitCommand::new(resolve_toolkit(toolkit)).args(["-hide_banner", "-encoders"]),
        }
    }

    /// Probe through an arbitrary listing command.
    pub fn with_command(command: ToolkitCommand) -> Self {
        Self { command }
    }

    async fn encoder_listing(&self) -> std::io::Result<String> {
        debug!("Encoder probe: {}", self.command);
        let output = Command::new(self.command.program())
            .args(self.command.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            warn!("{} exited with {} while listing encoders", self.command.program(), output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl EncoderAvailabilityChecker for FfmpegEncoderProbe {
    async fn is_available(&self, encoder: &str) -> bool {
        info!("Checking for {} availability...", encoder);

        let listing = match self.encoder_listing().await {
            Ok(text) => text,
            Err(e) => {
                error!("Error checking for {}: failed to run {}: {}", encoder, self.command.program(), e);
                error!("Is FFmpeg installed and in your system's PATH?");
                return false;
            }
        };

        if encoder_listed(&listing, encoder) {
            info!("{} encoder found.", encoder);
            true
        } else {
            error!("{} encoder not found by FFmpeg.", encoder);
            error!("Please ensure you have NVIDIA drivers installed and an FFmpeg build with NVENC enabled.");
            false
        }
    }
}

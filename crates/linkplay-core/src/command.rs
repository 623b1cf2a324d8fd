//! FFmpeg / ffplay command lines.
//!
//! Commands are kept as discrete argument tokens and handed to the OS as-is;
//! nothing here is ever passed through a shell. [`ToolkitCommand`]'s
//! `Display` form is for logs only.
//!
//! # Stream command
//!
//! ```text
//! ffmpeg -hide_banner
//!   -f gdigrab -framerate 60 -i desktop            (screen capture input)
//!   -c:v h264_nvenc -preset p1 -tune ll            (NVENC, fastest, low latency)
//!   -qp 0 -rc constqp                              (lossless constant QP)
//!   -f mpegts udp://192.168.1.100:5555             (MPEG-TS over UDP)
//! ```

use std::fmt;
use std::path::Path;

use crate::config::{ReceiverConfig, SenderConfig};

// ── ToolkitCommand ────────────────────────────────────────────────────────────

/// Program plus ordered arguments, ready for process creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolkitCommand {
    program: String,
    args:    Vec<String>,
}

impl ToolkitCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for ToolkitCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Build the screen-capture → NVENC → MPEG-TS/UDP command for `config`.
pub fn build_stream_command(config: &SenderConfig) -> ToolkitCommand {
    let enc = &config.encoder;
    ToolkitCommand::new(resolve_toolkit(&config.toolkit))
        .arg("-hide_banner")
        .args(["-f", config.capture.format()])
        .args(["-framerate".to_owned(), config.frame_rate.to_string()])
        .args(["-i", config.capture.input()])
        .args(["-c:v", enc.name.as_str()])
        .args(["-preset", enc.preset.as_str()])
        .args(["-tune", enc.tune.as_str()])
        .args(["-qp".to_owned(), enc.qp.to_string()])
        .args(["-rc", enc.rate_control.as_str()])
        .args(["-f", "mpegts"])
        .arg(config.target.udp_uri())
}

/// Build the low-latency ffplay command listening on `config.port`.
pub fn build_play_command(config: &ReceiverConfig) -> ToolkitCommand {
    ToolkitCommand::new(resolve_toolkit(&config.player))
        .args(["-fflags", "nobuffer"])
        .args(["-flags", "low_delay"])
        .arg("-framedrop")
        .args(["-strict", "experimental"])
        .args(["-window_title", config.window_title.as_str()])
        .arg("-infbuf")
        .arg("-i")
        .arg(format!("udp://@:{}", config.port))
}

/// Prefer a toolkit executable shipped next to our own binary; otherwise
/// leave `name` for the OS search path.
pub fn resolve_toolkit(name: &str) -> String {
    if Path::new(name).components().count() > 1 {
        return name.to_owned();
    }
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(format!("{name}{}", std::env::consts::EXE_SUFFIX))));

    match beside_exe {
        Some(path) if path.is_file() => path.to_string_lossy().into_owned(),
        _ => name.to_owned(),
    }
}

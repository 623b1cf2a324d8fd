//! linkplay-core — shared pieces of the LinkPlay sender and receiver.
//!
//! LinkPlay streams a desktop over UDP by driving FFmpeg as a child process;
//! nothing in this workspace encodes, muxes or decodes video itself.
//!
//! ```text
//! Sender (linkplay-sender)                   Receiver (linkplay-receiver)
//! ─────────────────────────────────          ─────────────────────────────
//! probe:  ffmpeg -encoders | h264_nvenc?
//! stream: ffmpeg screen → NVENC → MPEG-TS ─► ffplay udp://@:5555
//!                       udp://<host>:5555
//! ```

pub mod command;
pub mod config;
pub mod errors;
pub mod launcher;
pub mod probe;

pub use command::{build_play_command, build_stream_command, resolve_toolkit, ToolkitCommand};
pub use config::{
    CaptureInput, EncoderSettings, ReceiverConfig, SenderConfig, StreamTarget, TargetHost,
    WaitOptions, DEFAULT_ENCODER, DEFAULT_FRAME_RATE, DEFAULT_TARGET_HOST, STREAM_PORT,
};
pub use errors::{ConfigError, LaunchError};
pub use launcher::{ChildExit, CancelSignal, ProcessLauncher, RunningChild, StopReason, TokioLauncher};
pub use probe::{encoder_listed, EncoderAvailabilityChecker, FfmpegEncoderProbe};

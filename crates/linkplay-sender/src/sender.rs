//! The sender's single run: probe → build → launch → wait.
//!
//! ```text
//! Idle → Probing ─┬─► Aborted                      (bad config, encoder missing)
//!                 └─► CommandBuilt ─┬─► LaunchFailed   (spawn refused)
//!                                   └─► Streaming ─► Stopped
//! ```
//!
//! There is no restart: once the FFmpeg child exits, for whatever reason,
//! the run is over.

use linkplay_core::{
    build_stream_command, CancelSignal, ChildExit, ConfigError, EncoderAvailabilityChecker,
    LaunchError, ProcessLauncher, SenderConfig, StopReason,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Idle,
    Probing,
    Aborted,
    CommandBuilt,
    LaunchFailed,
    Streaming,
    Stopped,
}

impl SenderState {
    /// Edges of the diagram in the module docs.
    pub fn can_transition_to(self, next: SenderState) -> bool {
        use SenderState::*;
        matches!(
            (self, next),
            (Idle, Probing)
                | (Probing, Aborted)
                | (Probing, CommandBuilt)
                | (CommandBuilt, LaunchFailed)
                | (CommandBuilt, Streaming)
                | (Streaming, Stopped)
        )
    }
}

#[derive(Error, Debug)]
pub enum SenderError {
    #[error("{encoder} encoder is not available")]
    EncoderUnavailable { encoder: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

// ── Sender ────────────────────────────────────────────────────────────────────

pub struct Sender<C, L> {
    config:   SenderConfig,
    checker:  C,
    launcher: L,
    state:    SenderState,
}

impl<C, L> Sender<C, L>
where
    C: EncoderAvailabilityChecker,
    L: ProcessLauncher,
{
    pub fn new(config: SenderConfig, checker: C, launcher: L) -> Self {
        Self { config, checker, launcher, state: SenderState::Idle }
    }

    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Run once. Returns after the FFmpeg child has stopped, or with the
    /// error that kept it from starting.
    pub async fn run(&mut self, cancel: CancelSignal) -> Result<ChildExit, SenderError> {
        // ── 1. Probe ──────────────────────────────────────────────────────
        self.transition(SenderState::Probing);
        if let Err(e) = self.config.validate() {
            self.transition(SenderState::Aborted);
            return Err(e.into());
        }
        let encoder = self.config.encoder.name.clone();
        if !self.checker.is_available(&encoder).await {
            self.transition(SenderState::Aborted);
            return Err(SenderError::EncoderUnavailable { encoder });
        }

        // ── 2. Build ──────────────────────────────────────────────────────
        let command = build_stream_command(&self.config);
        info!("Executing FFmpeg command:\n{}", command);
        self.transition(SenderState::CommandBuilt);

        // ── 3. Launch ─────────────────────────────────────────────────────
        let mut child = match self.launcher.spawn(&command) {
            Ok(child) => child,
            Err(e) => {
                error!("{}", e);
                error!(
                    "Ensure {} is in your system's PATH or in the same directory as linkplay-sender.",
                    self.config.toolkit
                );
                self.transition(SenderState::LaunchFailed);
                return Err(e.into());
            }
        };
        self.transition(SenderState::Streaming);
        info!(
            "Streaming started to {} (pid {:?})... Press Ctrl+C to stop.",
            self.config.target.udp_uri(),
            child.id()
        );

        // ── 4. Wait ───────────────────────────────────────────────────────
        let exit = child.wait(self.config.wait, cancel).await.unwrap_or_else(|e| {
            warn!("{}", e);
            ChildExit { status: None, reason: StopReason::Exited }
        });
        self.transition(SenderState::Stopped);
        match exit.status {
            Some(status) => info!("Streaming stopped ({}).", status),
            None => info!("Streaming stopped."),
        }
        Ok(exit)
    }

    fn transition(&mut self, next: SenderState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal sender transition {:?} → {:?}",
            self.state,
            next
        );
        debug!("Sender: {:?} → {:?}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use std::process::ExitStatus;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use linkplay_core::launcher::never;
    use linkplay_core::{RunningChild, TargetHost, TokioLauncher, ToolkitCommand, WaitOptions};

    use super::*;

    #[cfg(unix)]
    fn exit_status(code: i32) -> ExitStatus {
        std::os::unix::process::ExitStatusExt::from_raw(code << 8)
    }

    #[cfg(windows)]
    fn exit_status(code: i32) -> ExitStatus {
        std::os::windows::process::ExitStatusExt::from_raw(code as u32)
    }

    struct FixedProbe(bool);

    #[async_trait]
    impl EncoderAvailabilityChecker for FixedProbe {
        async fn is_available(&self, _encoder: &str) -> bool {
            self.0
        }
    }

    /// Records spawned commands; every child exits with `code`.
    #[derive(Clone, Default)]
    struct RecordingLauncher {
        spawned: Arc<Mutex<Vec<ToolkitCommand>>>,
        code:    i32,
    }

    struct ExitedChild(i32);

    #[async_trait]
    impl RunningChild for ExitedChild {
        fn id(&self) -> Option<u32> {
            Some(4242)
        }

        async fn wait(&mut self, _: WaitOptions, _: CancelSignal) -> Result<ChildExit, LaunchError> {
            Ok(ChildExit { status: Some(exit_status(self.0)), reason: StopReason::Exited })
        }
    }

    impl ProcessLauncher for RecordingLauncher {
        fn spawn(&self, command: &ToolkitCommand) -> Result<Box<dyn RunningChild>, LaunchError> {
            self.spawned.lock().unwrap().push(command.clone());
            Ok(Box::new(ExitedChild(self.code)))
        }
    }

    fn config_for(host: &str) -> SenderConfig {
        SenderConfig::default().with_host(host).expect("valid host")
    }

    #[tokio::test]
    async fn streams_to_host_and_stops_cleanly() {
        let launcher = RecordingLauncher::default();
        let mut sender = Sender::new(config_for("10.0.0.5"), FixedProbe(true), launcher.clone());

        let exit = sender.run(never()).await.expect("clean run");
        assert_eq!(exit.code(), Some(0));
        assert_eq!(sender.state(), SenderState::Stopped);

        let spawned = launcher.spawned.lock().unwrap();
        assert_eq!(spawned.len(), 1);
        let line = spawned[0].to_string();
        assert!(line.ends_with("udp://10.0.0.5:5555"), "{line}");
        assert!(line.contains("-framerate 60"), "{line}");
    }

    #[tokio::test]
    async fn missing_encoder_aborts_without_launch() {
        let launcher = RecordingLauncher::default();
        let mut sender = Sender::new(SenderConfig::default(), FixedProbe(false), launcher.clone());

        let err = sender.run(never()).await.expect_err("probe failure aborts");
        assert!(matches!(err, SenderError::EncoderUnavailable { ref encoder } if encoder == "h264_nvenc"));
        assert_eq!(sender.state(), SenderState::Aborted);
        assert!(launcher.spawned.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn child_failure_is_still_a_stop() {
        let launcher = RecordingLauncher { code: 1, ..Default::default() };
        let mut sender = Sender::new(SenderConfig::default(), FixedProbe(true), launcher);

        let exit = sender.run(never()).await.expect("abnormal child exit is not an error");
        assert_eq!(exit.code(), Some(1));
        assert_eq!(sender.state(), SenderState::Stopped);
    }

    #[tokio::test]
    async fn launch_failure_reports_os_error_code() {
        let config = SenderConfig {
            toolkit: "/nonexistent/linkplay/ffmpeg".to_owned(),
            ..config_for("10.0.0.5")
        };
        let mut sender = Sender::new(config, FixedProbe(true), TokioLauncher);

        let err = sender.run(never()).await.expect_err("spawn must fail");
        assert_eq!(sender.state(), SenderState::LaunchFailed);
        match err {
            SenderError::Launch(launch) => {
                assert!(launch.os_code().is_some());
                assert!(launch.to_string().contains("error code"), "{launch}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn invalid_frame_rate_aborts_while_probing() {
        let config = SenderConfig { frame_rate: 0, ..Default::default() };
        let launcher = RecordingLauncher::default();
        let mut sender = Sender::new(config, FixedProbe(true), launcher.clone());

        assert!(matches!(sender.run(never()).await, Err(SenderError::Config(_))));
        assert_eq!(sender.state(), SenderState::Aborted);
        assert!(launcher.spawned.lock().unwrap().is_empty());
    }

    #[test]
    fn transitions_follow_the_diagram() {
        use SenderState::*;
        assert!(Idle.can_transition_to(Probing));
        assert!(Probing.can_transition_to(Aborted));
        assert!(!Idle.can_transition_to(Aborted));
        assert!(!Streaming.can_transition_to(Probing));
        assert!(!Stopped.can_transition_to(Streaming));
    }

    #[test]
    fn default_target_is_built_in_host() {
        let config = SenderConfig::default();
        assert_eq!(config.target.host, TargetHost::default());
        assert_eq!(config.target.host.as_str(), linkplay_core::DEFAULT_TARGET_HOST);
    }
}

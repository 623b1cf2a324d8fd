//! Child process launcher.
//!
//! Starts a [`ToolkitCommand`] with stdio, environment and working directory
//! inherited from the caller, then waits for it. The wait ends when:
//!
//! - the child exits on its own ([`StopReason::Exited`]),
//! - the cancel signal fires ([`StopReason::Cancelled`]), or
//! - the optional timeout elapses ([`StopReason::TimedOut`]).
//!
//! In the last two cases the child is asked to stop, given
//! [`WaitOptions::grace`] to exit, then killed. The polite request is a
//! SIGTERM and exists on Unix only; elsewhere the child is terminated at once
//! and `grace` has no effect. The child is always reaped before
//! `run_and_wait` returns.

use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::command::ToolkitCommand;
use crate::config::WaitOptions;
use crate::errors::LaunchError;

/// Future that resolves when the wait should be abandoned.
pub type CancelSignal = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Cancel on Ctrl-C / SIGINT.
pub fn ctrl_c() -> CancelSignal {
    Box::pin(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl-C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    })
}

/// Never cancel.
pub fn never() -> CancelSignal {
    Box::pin(std::future::pending())
}

// ── ChildExit ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Exited,
    Cancelled,
    TimedOut,
}

/// How a launched child ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildExit {
    /// `None` only if the child could not be reaped after a stop request.
    pub status: Option<ExitStatus>,
    pub reason: StopReason,
}

impl ChildExit {
    /// Exit code; `None` when the child was ended by a signal.
    pub fn code(&self) -> Option<i32> {
        self.status.and_then(|s| s.code())
    }
}

// ── ProcessLauncher ───────────────────────────────────────────────────────────

/// A launched child that has not been waited for yet.
#[async_trait]
pub trait RunningChild: Send {
    fn id(&self) -> Option<u32>;

    /// Block until the child stops (see module docs). Reaps the child.
    async fn wait(&mut self, options: WaitOptions, cancel: CancelSignal) -> Result<ChildExit, LaunchError>;
}

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    fn spawn(&self, command: &ToolkitCommand) -> Result<Box<dyn RunningChild>, LaunchError>;

    /// Spawn `command` and wait for it to stop.
    async fn run_and_wait(
        &self,
        command: &ToolkitCommand,
        options: WaitOptions,
        cancel:  CancelSignal,
    ) -> Result<ChildExit, LaunchError> {
        let mut child = self.spawn(command)?;
        child.wait(options, cancel).await
    }
}

/// [`ProcessLauncher`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioLauncher;

impl ProcessLauncher for TokioLauncher {
    fn spawn(&self, command: &ToolkitCommand) -> Result<Box<dyn RunningChild>, LaunchError> {
        let program = command.program();
        let child = Command::new(program)
            .args(command.arguments())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| LaunchError::spawn(program, e))?;

        debug!("Launched {} (pid {:?})", program, child.id());
        Ok(Box::new(TokioChild { child, program: program.to_owned() }))
    }
}

struct TokioChild {
    child:   Child,
    program: String,
}

#[async_trait]
impl RunningChild for TokioChild {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self, options: WaitOptions, cancel: CancelSignal) -> Result<ChildExit, LaunchError> {
        let program = self.program.as_str();
        let reason = tokio::select! {
            status = self.child.wait() => {
                let status = status.map_err(|source| LaunchError::Wait {
                    program: program.to_owned(),
                    source,
                })?;
                debug!("{} exited: {}", program, status);
                return Ok(ChildExit { status: Some(status), reason: StopReason::Exited });
            }
            _ = cancel => StopReason::Cancelled,
            _ = deadline(options.timeout) => StopReason::TimedOut,
        };

        info!("Stopping {} ({:?})", program, reason);
        let status = stop_child(&mut self.child, program, options.grace).await?;
        Ok(ChildExit { status, reason })
    }
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(d) => tokio::time::sleep(d).await,
        None => std::future::pending().await,
    }
}

/// Ask politely, wait `grace`, then kill. Always reaps the child.
async fn stop_child(
    child:   &mut Child,
    program: &str,
    grace:   Duration,
) -> Result<Option<ExitStatus>, LaunchError> {
    request_stop(child);

    if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
        return status
            .map(Some)
            .map_err(|source| LaunchError::Wait { program: program.to_owned(), source });
    }

    warn!("{} did not stop within {:?}, killing it", program, grace);
    if let Err(e) = child.start_kill() {
        warn!("Killing {}: {}", program, e);
    }
    match child.wait().await {
        Ok(status) => Ok(Some(status)),
        Err(e) => {
            warn!("Reaping {}: {}", program, e);
            Ok(None)
        }
    }
}

#[cfg(unix)]
fn request_stop(child: &mut Child) {
    let Some(pid) = child.id() else { return };
    // SAFETY: plain signal delivery to a pid we spawned and have not reaped.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc != 0 {
        debug!("SIGTERM to {}: {}", pid, std::io::Error::last_os_error());
    }
}

/// No graceful stop request outside Unix; terminate immediately.
#[cfg(not(unix))]
fn request_stop(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!("TerminateProcess: {}", e);
    }
}

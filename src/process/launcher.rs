//! # Worker process launching and exit notification.
//!
//! The supervisor never touches OS process APIs directly; it goes through a
//! [`Launcher`]. [`TokioLauncher`] is the production backend, tests plug in
//! fakes.
//!
//! ## Contract
//! - [`Launcher::launch`] starts the process and returns its pid. It must arrange
//!   for exactly one [`ExitNotice`] to be delivered through the given
//!   [`ExitSender`] once the process terminates.
//! - [`Launcher::signal`] only initiates delivery; completion is observed via the
//!   exit notice. Signalling a process that is already gone is not an error.
//!
//! ## Stdio
//! Workers inherit stdout/stderr; stdin is closed.

use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{ExitStatus, Stdio};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::sync::mpsc;

use crate::error::SpawnError;
use crate::process::args::WorkerCommand;

/// How a worker process terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerExit {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal number, if the process was killed by a signal.
    pub signal: Option<i32>,
}

impl WorkerExit {
    /// Normal exit with `code`.
    pub fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    /// Termination by `signal`.
    pub fn signaled(signal: Signal) -> Self {
        Self {
            code: None,
            signal: Some(signal as i32),
        }
    }

    /// Status could not be determined (wait failed).
    pub fn unknown() -> Self {
        Self {
            code: None,
            signal: None,
        }
    }

    /// Single integer status: the exit code, `128 + signal`, or `-1` if unknown.
    pub fn status(&self) -> i32 {
        match (self.code, self.signal) {
            (Some(code), _) => code,
            (None, Some(sig)) => 128 + sig,
            (None, None) => -1,
        }
    }

    /// True when the process was terminated by `sig`.
    pub fn is_signal(&self, sig: Signal) -> bool {
        self.signal == Some(sig as i32)
    }
}

impl From<ExitStatus> for WorkerExit {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
            signal: status.signal(),
        }
    }
}

/// Termination report for one launched process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExitNotice {
    /// Slot the process was launched for.
    pub worker_id: u8,
    /// Pid returned by [`Launcher::launch`].
    pub pid: u32,
    /// How it terminated.
    pub exit: WorkerExit,
}

/// Sending half of the supervisor's exit-notification channel.
#[derive(Clone, Debug)]
pub struct ExitSender {
    tx: mpsc::UnboundedSender<ExitNotice>,
}

impl ExitSender {
    pub(crate) fn new(tx: mpsc::UnboundedSender<ExitNotice>) -> Self {
        Self { tx }
    }

    /// Delivers a notice; dropped silently once the supervisor is gone.
    pub fn notify(&self, notice: ExitNotice) {
        let _ = self.tx.send(notice);
    }
}

/// Backend that creates and signals worker processes.
pub trait Launcher: Send + Sync + 'static {
    /// Starts `command` and returns the child's pid.
    fn launch(&self, command: &WorkerCommand, exits: ExitSender) -> Result<u32, SpawnError>;

    /// Sends `signal` to `pid`.
    fn signal(&self, pid: u32, signal: Signal) -> std::io::Result<()>;
}

/// Launches workers with [`tokio::process::Command`].
///
/// Each child runs in its own process group so terminal-generated signals
/// reach only the master, and is reaped by a background task that reports the
/// exit status.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioLauncher;

impl TokioLauncher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Launcher for TokioLauncher {
    fn launch(&self, command: &WorkerCommand, exits: ExitSender) -> Result<u32, SpawnError> {
        let worker = command.worker_id;

        let mut std_cmd = std::process::Command::new(&command.program);
        std_cmd
            .args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .process_group(0);

        let mut cmd = tokio::process::Command::from(std_cmd);
        cmd.kill_on_drop(false);

        let mut child = cmd
            .spawn()
            .map_err(|source| SpawnError::Io { worker, source })?;
        let pid = child.id().ok_or(SpawnError::NoPid { worker })?;

        tokio::spawn(async move {
            let exit = match child.wait().await {
                Ok(status) => WorkerExit::from(status),
                Err(e) => {
                    tracing::warn!(worker, pid, error = %e, "failed to reap worker");
                    WorkerExit::unknown()
                }
            };
            exits.notify(ExitNotice {
                worker_id: worker,
                pid,
                exit,
            });
        });
        Ok(pid)
    }

    fn signal(&self, pid: u32, sig: Signal) -> std::io::Result<()> {
        let raw = i32::try_from(pid).map_err(|_| std::io::Error::from(Errno::EINVAL))?;
        match signal::kill(Pid::from_raw(raw), sig) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

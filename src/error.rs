//! Error types used by the procvisor runtime and by individual spawn attempts.
//!
//! This module defines two main error enums:
//!
//! - [`ClusterError`]: errors raised by the supervisor itself (configuration,
//!   startup, shutdown escalation, control-channel failures).
//! - [`SpawnError`]: errors raised by a single attempt to launch a worker.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logs/metrics.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the procvisor supervisor.
///
/// Only [`ClusterError::MissingPort`], [`ClusterError::InvalidWorkerTag`],
/// [`ClusterError::SignalSetup`] and [`ClusterError::TooManySpawnFailures`]
/// abort initialization. Everything that happens after the pool is running is
/// handled locally and reflected in worker state.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClusterError {
    /// The configuration did not name a listening port.
    #[error("invalid cluster configuration: port is required")]
    MissingPort,

    /// The process was launched with a malformed worker tag.
    #[error("malformed worker tag: {detail}")]
    InvalidWorkerTag {
        /// What was wrong with the tag.
        detail: String,
    },

    /// Installing the master's signal listeners failed.
    #[error("failed to install signal handlers: {0}")]
    SignalSetup(#[source] std::io::Error),

    /// More than half of the initial spawns failed.
    #[error("{failed} of {total} workers failed to spawn; aborting")]
    TooManySpawnFailures {
        /// Number of slots whose initial spawn failed.
        failed: u8,
        /// Resolved worker count.
        total: u8,
    },

    /// Shutdown deadline was exceeded; remaining workers were killed.
    #[error("shutdown timeout {timeout:?} exceeded; force-killed workers {killed:?}")]
    ShutdownTimeout {
        /// The configured shutdown timeout.
        timeout: Duration,
        /// Worker ids that were still alive and received the kill signal.
        killed: Vec<u8>,
    },

    /// The supervisor loop is no longer running.
    #[error("supervisor loop is not running")]
    Closed,

    /// The supervisor loop terminated abnormally.
    #[error("supervisor loop aborted: {reason}")]
    Aborted {
        /// Panic message or join failure description.
        reason: String,
    },
}

impl ClusterError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use procvisor::ClusterError;
    ///
    /// assert_eq!(ClusterError::MissingPort.as_label(), "cluster_missing_port");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ClusterError::MissingPort => "cluster_missing_port",
            ClusterError::InvalidWorkerTag { .. } => "cluster_invalid_worker_tag",
            ClusterError::SignalSetup(_) => "cluster_signal_setup",
            ClusterError::TooManySpawnFailures { .. } => "cluster_too_many_spawn_failures",
            ClusterError::ShutdownTimeout { .. } => "cluster_shutdown_timeout",
            ClusterError::Closed => "cluster_closed",
            ClusterError::Aborted { .. } => "cluster_aborted",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ClusterError::MissingPort => "port is required".to_string(),
            ClusterError::InvalidWorkerTag { detail } => format!("worker tag: {detail}"),
            ClusterError::SignalSetup(e) => format!("signal setup: {e}"),
            ClusterError::TooManySpawnFailures { failed, total } => {
                format!("spawn failures: {failed}/{total}")
            }
            ClusterError::ShutdownTimeout { timeout, killed } => {
                format!("shutdown timeout after {timeout:?}; killed={killed:?}")
            }
            ClusterError::Closed => "supervisor closed".to_string(),
            ClusterError::Aborted { reason } => format!("aborted: {reason}"),
        }
    }
}

/// # Errors produced by a single worker launch attempt.
///
/// A spawn failure never aborts the master once the pool is running: the slot
/// is marked disabled and the failure is published as an event.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SpawnError {
    /// The invocation arguments were never captured.
    #[error("original arguments not captured")]
    ArgsNotCaptured,

    /// The OS refused to create the process.
    #[error("failed to spawn worker {worker}: {source}")]
    Io {
        /// Slot that was being spawned.
        worker: u8,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The child was created but exited before its pid could be read.
    #[error("spawned worker {worker} has no pid")]
    NoPid {
        /// Slot that was being spawned.
        worker: u8,
    },
}

impl SpawnError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use procvisor::SpawnError;
    ///
    /// assert_eq!(SpawnError::ArgsNotCaptured.as_label(), "spawn_args_not_captured");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SpawnError::ArgsNotCaptured => "spawn_args_not_captured",
            SpawnError::Io { .. } => "spawn_io",
            SpawnError::NoPid { .. } => "spawn_no_pid",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SpawnError::ArgsNotCaptured => "arguments not captured".to_string(),
            SpawnError::Io { worker, source } => format!("worker {worker}: {source}"),
            SpawnError::NoPid { worker } => format!("worker {worker}: no pid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        let err = ClusterError::TooManySpawnFailures { failed: 3, total: 4 };
        assert_eq!(err.as_label(), "cluster_too_many_spawn_failures");
        assert_eq!(err.to_string(), "3 of 4 workers failed to spawn; aborting");

        let err = SpawnError::NoPid { worker: 2 };
        assert_eq!(err.as_label(), "spawn_no_pid");
        assert_eq!(err.as_message(), "worker 2: no pid");
    }

    #[test]
    fn shutdown_timeout_lists_killed_workers() {
        let err = ClusterError::ShutdownTimeout {
            timeout: Duration::from_millis(100),
            killed: vec![0, 3],
        };
        assert!(err.as_message().contains("killed=[0, 3]"));
    }
}

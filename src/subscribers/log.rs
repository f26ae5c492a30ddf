//! # Logging subscriber.
//!
//! [`LogWriter`] renders supervisor events through [`tracing`]. Routine
//! lifecycle goes to `info`, crashes and overflow to `warn`, crash loops and
//! forced kills to `error`.
//!
//! ## Output (with a fmt subscriber)
//! ```text
//! INFO  procvisor: worker spawned worker=0 pid=4211
//! WARN  procvisor: worker crashed worker=2 pid=4213 exit_status=1 uptime_ms=812
//! INFO  procvisor: respawn scheduled worker=2 delay_ms=100
//! ERROR procvisor: crash loop detected, respawn disabled worker=2 crashes=3 span_ms=1404
//! INFO  procvisor: shutdown requested reason=SIGTERM
//! INFO  procvisor: all workers stopped
//! ```
//!
//! ## Example
//! ```no_run
//! # async fn run() -> Result<(), procvisor::ClusterError> {
//! use std::sync::Arc;
//! use procvisor::{Cluster, ClusterConfig, LogWriter};
//!
//! let cfg = ClusterConfig { port: 8080, ..ClusterConfig::default() };
//! let role = Cluster::builder(cfg)
//!     .with_subscribers(vec![Arc::new(LogWriter::new())])
//!     .build()
//!     .init(std::env::args_os().collect::<Vec<_>>())
//!     .await?;
//! # let _ = role;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "procvisor";

/// Event subscriber that writes through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::WorkerSpawned => {
                tracing::info!(target: TARGET, worker = e.worker, pid = e.pid, "worker spawned");
            }
            EventKind::SpawnFailed => {
                tracing::error!(target: TARGET, worker = e.worker, reason, "worker spawn failed");
            }
            EventKind::WorkerExited => {
                tracing::info!(
                    target: TARGET,
                    worker = e.worker,
                    pid = e.pid,
                    exit_status = e.exit_status,
                    uptime_ms = e.uptime_ms,
                    "worker exited"
                );
            }
            EventKind::WorkerCrashed => {
                tracing::warn!(
                    target: TARGET,
                    worker = e.worker,
                    pid = e.pid,
                    exit_status = e.exit_status,
                    uptime_ms = e.uptime_ms,
                    "worker crashed"
                );
            }
            EventKind::RespawnScheduled => {
                tracing::info!(target: TARGET, worker = e.worker, delay_ms = e.delay_ms, "respawn scheduled");
            }
            EventKind::CrashLoopDetected => {
                tracing::error!(
                    target: TARGET,
                    worker = e.worker,
                    crashes = e.crashes,
                    span_ms = e.delay_ms,
                    "crash loop detected, respawn disabled"
                );
            }
            EventKind::PoolReady => {
                tracing::info!(target: TARGET, port = e.port, reason, "worker pool ready");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: TARGET, reason, "shutdown requested");
            }
            EventKind::RestartRequested => {
                tracing::info!(target: TARGET, "graceful restart requested");
            }
            EventKind::RestartCompleted => {
                tracing::info!(target: TARGET, "graceful restart completed");
            }
            EventKind::AllStopped => {
                tracing::info!(target: TARGET, "all workers stopped");
            }
            EventKind::ShutdownTimeout => {
                tracing::error!(
                    target: TARGET,
                    timeout_ms = e.delay_ms,
                    killed = reason,
                    "shutdown timeout exceeded, remaining workers killed"
                );
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: TARGET, reason, "subscriber dropped an event");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: TARGET, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

//! Read-only snapshots of pool and worker state.

use std::fmt;
use std::time::{Duration, SystemTime};

/// Lifecycle state of one worker slot.
///
/// ```text
/// Starting ──► Active ──► Stopping
///    │           │           │
///    │           └─────┬─────┘ (process exit)
///    ▼                 ▼
/// Disabled ◄── {Crashed | Respawning | Disabled}
///                      │
///            Respawning ──► Starting (timer)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkerStatus {
    Starting,
    Active,
    Stopping,
    Crashed,
    Respawning,
    Disabled,
}

impl WorkerStatus {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerStatus::Starting => "starting",
            WorkerStatus::Active => "active",
            WorkerStatus::Stopping => "stopping",
            WorkerStatus::Crashed => "crashed",
            WorkerStatus::Respawning => "respawning",
            WorkerStatus::Disabled => "disabled",
        }
    }

    /// True while a process occupies the slot or is about to.
    #[inline]
    pub fn is_live(self) -> bool {
        matches!(
            self,
            WorkerStatus::Starting
                | WorkerStatus::Active
                | WorkerStatus::Stopping
                | WorkerStatus::Respawning
        )
    }
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one worker slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerStats {
    pub worker_id: u8,
    /// Current pid, `0` when no process is running.
    pub pid: u32,
    pub port: u16,
    pub status: WorkerStatus,
    /// Wall-clock time of the last successful spawn.
    pub start_time: Option<SystemTime>,
    /// Time since the last spawn; zero unless the slot is active.
    pub uptime: Duration,
    /// Last observed exit status (`128 + signal` for signal deaths).
    pub exit_status: i32,
    /// Crashes currently held in the crash-loop history.
    pub crash_count: u8,
    pub respawn_disabled: bool,
}

/// Aggregate snapshot of the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClusterStats {
    pub total_workers: u8,
    pub active_workers: u8,
    pub crashed_workers: u8,
    pub disabled_workers: u8,
    pub shutdown_requested: bool,
    pub restart_requested: bool,
    /// Respawns scheduled since the master started.
    pub total_restarts: u64,
}

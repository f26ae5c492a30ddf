//! # Runtime events emitted by the supervisor.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Worker events**: spawn, exit, crash, respawn scheduling, crash loops
//! - **Pool events**: startup readiness, shutdown, graceful restart
//! - **Subscriber events**: delivery problems inside the fan-out layer
//!
//! The [`Event`] struct carries additional metadata such as timestamps, worker
//! id, pid, exit status and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use procvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RespawnScheduled)
//!     .with_worker(2)
//!     .with_delay(Duration::from_millis(100));
//!
//! assert_eq!(ev.kind, EventKind::RespawnScheduled);
//! assert_eq!(ev.worker, Some(2));
//! assert_eq!(ev.delay_ms, Some(100));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` (subscriber name and panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason`.
    SubscriberOverflow,

    // === Worker events ===
    /// Worker process created; slot is active.
    ///
    /// Sets: `worker`, `pid`.
    WorkerSpawned,

    /// Worker could not be created; slot is disabled.
    ///
    /// Sets: `worker`, `reason`.
    SpawnFailed,

    /// Worker exited cleanly (or was stopped by the supervisor).
    ///
    /// Sets: `worker`, `pid`, `exit_status`, `uptime_ms`.
    WorkerExited,

    /// Worker exited unexpectedly with a failure status.
    ///
    /// Sets: `worker`, `pid`, `exit_status`, `uptime_ms`.
    WorkerCrashed,

    /// One-shot respawn timer armed for the slot.
    ///
    /// Sets: `worker`, `delay_ms`.
    RespawnScheduled,

    /// Slot crashed too often within the window; respawn disabled for good.
    ///
    /// Sets: `worker`, `crashes`, `delay_ms` (span between oldest and newest crash).
    CrashLoopDetected,

    // === Pool events ===
    /// Initial spawn sequence finished.
    ///
    /// Sets: `port`, `reason` (worker count summary).
    PoolReady,

    /// Terminate/interrupt received or shutdown requested programmatically.
    ///
    /// Sets: `reason` (trigger).
    ShutdownRequested,

    /// Graceful restart started; every active worker is being stopped.
    RestartRequested,

    /// Every restarted slot is active again.
    RestartCompleted,

    /// No live workers remain; the supervisor loop is exiting.
    AllStopped,

    /// Shutdown timeout exceeded; remaining workers were killed.
    ///
    /// Sets: `delay_ms` (timeout), `reason` (killed worker ids).
    ShutdownTimeout,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Worker slot, if applicable.
    pub worker: Option<u8>,
    /// OS process id, if applicable.
    pub pid: Option<u32>,
    /// Folded exit status (see [`WorkerExit::status`](crate::WorkerExit::status)).
    pub exit_status: Option<i32>,
    /// How long the process ran, in milliseconds.
    pub uptime_ms: Option<u64>,
    /// Delay or duration in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Crash count, for crash-loop events.
    pub crashes: Option<u8>,
    /// Shared listening port, for pool events.
    pub port: Option<u16>,
    /// Human-readable reason (errors, triggers, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            pid: None,
            exit_status: None,
            uptime_ms: None,
            delay_ms: None,
            crashes: None,
            port: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_worker(mut self, id: u8) -> Self {
        self.worker = Some(id);
        self
    }

    #[inline]
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    #[inline]
    pub fn with_exit_status(mut self, status: i32) -> Self {
        self.exit_status = Some(status);
        self
    }

    /// Attaches process uptime (stored as milliseconds).
    #[inline]
    pub fn with_uptime(mut self, d: Duration) -> Self {
        self.uptime_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    #[inline]
    pub fn with_crashes(mut self, n: usize) -> Self {
        self.crashes = Some(n.min(usize::from(u8::MAX)) as u8);
        self
    }

    #[inline]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} panic={info}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::new(EventKind::WorkerSpawned);
        let b = Event::new(EventKind::WorkerExited);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn compact_fields_saturate() {
        let ev = Event::new(EventKind::ShutdownTimeout)
            .with_delay(Duration::from_secs(u64::MAX / 2))
            .with_crashes(1_000);
        assert_eq!(ev.delay_ms, Some(u32::MAX));
        assert_eq!(ev.crashes, Some(u8::MAX));
    }
}

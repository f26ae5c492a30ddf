//! # Worker table and per-slot state machine.
//!
//! [`Pool`] owns every [`WorkerRecord`] and applies all transitions. It is
//! driven exclusively by the supervisor loop, one event at a time, so no
//! locking is involved.
//!
//! ```text
//! spawn(id):      Starting ─ok──► Active          Starting ─err──► Disabled
//! stop request:   Active ──────► Stopping  (+ SIGTERM)
//! on_exit:        Active|Stopping ──► shutdown requested ........ Crashed | Disabled
//!                                 ├─► restart in progress ....... Respawning
//!                                 ├─► crash && respawn enabled
//!                                 │       ├─ Approved ........... Respawning
//!                                 │       └─ CrashLoop .......... Disabled
//!                                 └─► otherwise ................. Crashed | Disabled
//! respawn due:    Respawning ──► spawn(id)   (Crashed if shutdown is underway)
//! ```
//!
//! ## Exit classification
//! An exit is a crash iff no shutdown or restart is in progress, the status is
//! non-zero, and the process was not terminated by `SIGTERM` or `SIGINT`.
//! Signal deaths report status `128 + signal`.
//!
//! ## Rules
//! - An exit notice whose pid is not the slot's current pid is ignored.
//! - Clean exits never touch the crash history.
//! - With respawn disabled, crashes are not recorded either.
//! - `respawn_disabled` is never cleared.
//! - A graceful restart is complete once no slot is `Stopping`, `Respawning`
//!   or `Starting`.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use nix::sys::signal::Signal;
use tokio::time::Instant;

use crate::core::config::Settings;
use crate::core::stats::{ClusterStats, WorkerStats, WorkerStatus};
use crate::error::SpawnError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::{CrashHistory, RespawnVerdict};
use crate::process::{ExitNotice, ExitSender, Launcher, ReexecArgs};
use crate::subscribers::WorkerHooks;

/// State of one worker slot.
#[derive(Debug)]
pub(crate) struct WorkerRecord {
    id: u8,
    pid: Option<u32>,
    status: WorkerStatus,
    start_time: Option<SystemTime>,
    started: Option<Instant>,
    exit_status: i32,
    history: CrashHistory,
    respawn_disabled: bool,
}

impl WorkerRecord {
    fn new(id: u8, crash_capacity: usize) -> Self {
        Self {
            id,
            pid: None,
            status: WorkerStatus::Starting,
            start_time: None,
            started: None,
            exit_status: 0,
            history: CrashHistory::new(crash_capacity),
            respawn_disabled: false,
        }
    }

    fn snapshot(&self, port: u16, now: Instant) -> WorkerStats {
        let uptime = match (self.status, self.started) {
            (WorkerStatus::Active, Some(t)) => now.saturating_duration_since(t),
            _ => Duration::ZERO,
        };
        WorkerStats {
            worker_id: self.id,
            pid: self.pid.unwrap_or(0),
            port,
            status: self.status,
            start_time: self.start_time,
            uptime,
            exit_status: self.exit_status,
            crash_count: u8::try_from(self.history.len()).unwrap_or(u8::MAX),
            respawn_disabled: self.respawn_disabled,
        }
    }
}

/// Worker table plus the global supervisor flags.
pub(crate) struct Pool {
    settings: Settings,
    slots: Vec<WorkerRecord>,
    reexec: ReexecArgs,
    launcher: Arc<dyn Launcher>,
    hooks: Arc<dyn WorkerHooks>,
    bus: Bus,
    exits: ExitSender,
    shutdown_requested: bool,
    restart_in_progress: bool,
    total_restarts: u64,
}

impl Pool {
    pub(crate) fn new(
        settings: Settings,
        reexec: ReexecArgs,
        launcher: Arc<dyn Launcher>,
        hooks: Arc<dyn WorkerHooks>,
        bus: Bus,
        exits: ExitSender,
    ) -> Self {
        let capacity = settings.crash_policy.capacity();
        let slots = (0..settings.workers)
            .map(|id| WorkerRecord::new(id, capacity))
            .collect();
        Self {
            settings,
            slots,
            reexec,
            launcher,
            hooks,
            bus,
            exits,
            shutdown_requested: false,
            restart_in_progress: false,
            total_restarts: 0,
        }
    }

    #[inline]
    pub(crate) fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    pub(crate) fn worker_count(&self) -> u8 {
        self.settings.workers
    }

    #[inline]
    pub(crate) fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    /// Launches a process for slot `id` (must be below the worker count).
    pub(crate) fn spawn(&mut self, id: u8) -> Result<u32, SpawnError> {
        let idx = usize::from(id);
        self.slots[idx].status = WorkerStatus::Starting;

        let launched = self
            .reexec
            .worker_command(id, self.settings.port)
            .and_then(|cmd| self.launcher.launch(&cmd, self.exits.clone()));

        let slot = &mut self.slots[idx];
        let result = match launched {
            Ok(pid) => {
                slot.status = WorkerStatus::Active;
                slot.pid = Some(pid);
                slot.start_time = Some(SystemTime::now());
                slot.started = Some(Instant::now());
                self.hooks.on_start(id);
                self.bus.publish(
                    Event::new(EventKind::WorkerSpawned)
                        .with_worker(id)
                        .with_pid(pid),
                );
                Ok(pid)
            }
            Err(e) => {
                slot.status = WorkerStatus::Disabled;
                slot.pid = None;
                self.bus.publish(
                    Event::new(EventKind::SpawnFailed)
                        .with_worker(id)
                        .with_reason(e.as_message()),
                );
                Err(e)
            }
        };
        self.check_restart_complete();
        result
    }

    /// Applies a process exit. Returns the respawn delay when a timer must be armed.
    pub(crate) fn on_exit(&mut self, notice: ExitNotice, now: Instant) -> Option<Duration> {
        let shutdown = self.shutdown_requested;
        let restart = self.restart_in_progress;
        let respawn = self.settings.respawn;
        let policy = self.settings.crash_policy;
        let respawn_delay = self.settings.respawn_delay;

        let slot = self.slots.get_mut(usize::from(notice.worker_id))?;
        if slot.pid != Some(notice.pid) {
            tracing::debug!(
                worker = notice.worker_id,
                pid = notice.pid,
                current = ?slot.pid,
                "ignoring exit of a stale process"
            );
            return None;
        }

        let status = notice.exit.status();
        let uptime = slot
            .started
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        slot.pid = None;
        slot.exit_status = status;

        let stopped_by_signal =
            notice.exit.is_signal(Signal::SIGTERM) || notice.exit.is_signal(Signal::SIGINT);
        let is_crash = !shutdown && !restart && status != 0 && !stopped_by_signal;

        let kind = if is_crash {
            EventKind::WorkerCrashed
        } else {
            EventKind::WorkerExited
        };
        self.bus.publish(
            Event::new(kind)
                .with_worker(slot.id)
                .with_pid(notice.pid)
                .with_exit_status(status)
                .with_uptime(uptime),
        );
        self.hooks.on_exit(slot.id, status, is_crash);

        let next = if shutdown {
            if slot.respawn_disabled {
                WorkerStatus::Disabled
            } else {
                WorkerStatus::Crashed
            }
        } else if restart {
            WorkerStatus::Respawning
        } else if is_crash && respawn {
            match policy.evaluate(&mut slot.history, now) {
                RespawnVerdict::Approved => WorkerStatus::Respawning,
                RespawnVerdict::CrashLoop { crashes, span } => {
                    slot.respawn_disabled = true;
                    self.bus.publish(
                        Event::new(EventKind::CrashLoopDetected)
                            .with_worker(slot.id)
                            .with_crashes(crashes)
                            .with_delay(span),
                    );
                    WorkerStatus::Disabled
                }
            }
        } else if slot.respawn_disabled {
            WorkerStatus::Disabled
        } else {
            WorkerStatus::Crashed
        };
        slot.status = next;

        let delay = if next == WorkerStatus::Respawning {
            self.total_restarts += 1;
            self.bus.publish(
                Event::new(EventKind::RespawnScheduled)
                    .with_worker(notice.worker_id)
                    .with_delay(respawn_delay),
            );
            Some(respawn_delay)
        } else {
            None
        };
        self.check_restart_complete();
        delay
    }

    /// Respawn timer for slot `id` fired.
    pub(crate) fn on_respawn_due(&mut self, id: u8) {
        let Some(slot) = self.slots.get_mut(usize::from(id)) else {
            return;
        };
        if slot.status != WorkerStatus::Respawning {
            return;
        }
        if self.shutdown_requested {
            slot.status = WorkerStatus::Crashed;
            return;
        }
        // Failures are published and leave the slot disabled.
        let _ = self.spawn(id);
    }

    /// Starts shutdown: every active worker moves to `Stopping` and gets `SIGTERM`.
    ///
    /// Returns `false` if shutdown was already requested.
    pub(crate) fn request_shutdown(&mut self, reason: &str) -> bool {
        if self.shutdown_requested {
            return false;
        }
        self.shutdown_requested = true;
        self.bus
            .publish(Event::new(EventKind::ShutdownRequested).with_reason(reason));
        self.stop_active();
        true
    }

    /// Starts a graceful restart: every active worker is stopped at once and
    /// respawned when it exits.
    ///
    /// Returns `false` if a shutdown or restart is already underway.
    pub(crate) fn request_restart(&mut self) -> bool {
        if self.shutdown_requested || self.restart_in_progress {
            tracing::info!(
                shutdown = self.shutdown_requested,
                restart = self.restart_in_progress,
                "graceful restart ignored"
            );
            return false;
        }
        self.restart_in_progress = true;
        self.bus.publish(Event::new(EventKind::RestartRequested));
        self.stop_active();
        self.check_restart_complete();
        true
    }

    fn stop_active(&mut self) {
        for slot in &mut self.slots {
            if slot.status != WorkerStatus::Active {
                continue;
            }
            slot.status = WorkerStatus::Stopping;
            if let Some(pid) = slot.pid {
                if let Err(e) = self.launcher.signal(pid, Signal::SIGTERM) {
                    tracing::warn!(worker = slot.id, pid, error = %e, "failed to stop worker");
                }
            }
        }
    }

    fn check_restart_complete(&mut self) {
        if !self.restart_in_progress {
            return;
        }
        let pending = self.slots.iter().any(|s| {
            matches!(
                s.status,
                WorkerStatus::Stopping | WorkerStatus::Respawning | WorkerStatus::Starting
            )
        });
        if !pending {
            self.restart_in_progress = false;
            self.bus.publish(Event::new(EventKind::RestartCompleted));
        }
    }

    /// Sends `signal` to every active worker. Returns how many were signalled.
    pub(crate) fn signal_all(&self, signal: Signal) -> usize {
        let mut delivered = 0;
        for slot in &self.slots {
            let (WorkerStatus::Active, Some(pid)) = (slot.status, slot.pid) else {
                continue;
            };
            match self.launcher.signal(pid, signal) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(worker = slot.id, pid, ?signal, error = %e, "signal delivery failed");
                }
            }
        }
        delivered
    }

    /// Sends `SIGKILL` to every active or stopping worker and returns their ids.
    pub(crate) fn force_kill_remaining(&self) -> Vec<u8> {
        let mut killed = Vec::new();
        for slot in &self.slots {
            if !matches!(slot.status, WorkerStatus::Active | WorkerStatus::Stopping) {
                continue;
            }
            let Some(pid) = slot.pid else { continue };
            if let Err(e) = self.launcher.signal(pid, Signal::SIGKILL) {
                tracing::warn!(worker = slot.id, pid, error = %e, "failed to kill worker");
            }
            killed.push(slot.id);
        }
        killed
    }

    /// True while any slot is starting, active, stopping or awaiting respawn.
    pub(crate) fn any_live(&self) -> bool {
        self.slots.iter().any(|s| s.status.is_live())
    }

    pub(crate) fn stats(&self) -> ClusterStats {
        let count = |status: WorkerStatus| {
            let n = self.slots.iter().filter(|s| s.status == status).count();
            u8::try_from(n).unwrap_or(u8::MAX)
        };
        ClusterStats {
            total_workers: self.settings.workers,
            active_workers: count(WorkerStatus::Active),
            crashed_workers: count(WorkerStatus::Crashed),
            disabled_workers: count(WorkerStatus::Disabled),
            shutdown_requested: self.shutdown_requested,
            restart_requested: self.restart_in_progress,
            total_restarts: self.total_restarts,
        }
    }

    pub(crate) fn worker_stats(&self, id: u8, now: Instant) -> Option<WorkerStats> {
        self.slots
            .get(usize::from(id))
            .map(|s| s.snapshot(self.settings.port, now))
    }

    /// Snapshots of at most `capacity` slots, in id order.
    pub(crate) fn all_worker_stats(&self, capacity: usize, now: Instant) -> Vec<WorkerStats> {
        self.slots
            .iter()
            .take(capacity)
            .map(|s| s.snapshot(self.settings.port, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ClusterConfig;
    use crate::process::{WorkerCommand, WorkerExit};
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::mpsc;

    /// Launcher that hands out fake pids and records signals.
    #[derive(Default)]
    struct FakeLauncher {
        next_pid: AtomicU32,
        failing: Mutex<HashSet<u8>>,
        launched: Mutex<Vec<(u8, u32)>>,
        signals: Mutex<Vec<(u32, Signal)>>,
    }

    impl Launcher for FakeLauncher {
        fn launch(&self, cmd: &WorkerCommand, _exits: ExitSender) -> Result<u32, SpawnError> {
            if self.failing.lock().unwrap().contains(&cmd.worker_id) {
                return Err(SpawnError::Io {
                    worker: cmd.worker_id,
                    source: std::io::ErrorKind::NotFound.into(),
                });
            }
            let pid = 1000 + self.next_pid.fetch_add(1, Ordering::Relaxed);
            self.launched.lock().unwrap().push((cmd.worker_id, pid));
            Ok(pid)
        }

        fn signal(&self, pid: u32, signal: Signal) -> std::io::Result<()> {
            self.signals.lock().unwrap().push((pid, signal));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingHooks {
        exits: Mutex<Vec<(u8, i32, bool)>>,
    }

    impl WorkerHooks for RecordingHooks {
        fn on_exit(&self, worker_id: u8, exit_status: i32, is_crash: bool) {
            self.exits
                .lock()
                .unwrap()
                .push((worker_id, exit_status, is_crash));
        }
    }

    struct Harness {
        pool: Pool,
        launcher: Arc<FakeLauncher>,
        hooks: Arc<RecordingHooks>,
        _exits: mpsc::UnboundedReceiver<ExitNotice>,
    }

    fn harness(cfg: ClusterConfig) -> Harness {
        let settings = ClusterConfig { port: 9000, ..cfg }.resolve(4).unwrap();
        let launcher = Arc::new(FakeLauncher::default());
        let hooks = Arc::new(RecordingHooks::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let pool = Pool::new(
            settings,
            ReexecArgs::new("/bin/app", vec!["app".into()]),
            launcher.clone(),
            hooks.clone(),
            Bus::new(64),
            ExitSender::new(tx),
        );
        Harness {
            pool,
            launcher,
            hooks,
            _exits: rx,
        }
    }

    fn start_all(pool: &mut Pool) -> Vec<u32> {
        (0..pool.worker_count())
            .map(|id| pool.spawn(id).unwrap())
            .collect()
    }

    fn exit(id: u8, pid: u32, exit: WorkerExit) -> ExitNotice {
        ExitNotice {
            worker_id: id,
            pid,
            exit,
        }
    }

    fn status_of(pool: &Pool, id: u8) -> WorkerStatus {
        pool.worker_stats(id, Instant::now()).unwrap().status
    }

    #[tokio::test(start_paused = true)]
    async fn spawn_marks_active_and_failure_disables() {
        let mut h = harness(ClusterConfig {
            workers: 2,
            ..ClusterConfig::default()
        });
        h.launcher.failing.lock().unwrap().insert(1);

        let pid = h.pool.spawn(0).unwrap();
        assert!(h.pool.spawn(1).is_err());

        let w0 = h.pool.worker_stats(0, Instant::now()).unwrap();
        assert_eq!(w0.status, WorkerStatus::Active);
        assert_eq!(w0.pid, pid);
        assert_eq!(w0.port, 9000);
        assert_eq!(status_of(&h.pool, 1), WorkerStatus::Disabled);
        assert_eq!(h.pool.stats().disabled_workers, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn crash_without_respawn_ends_crashed() {
        let mut h = harness(ClusterConfig {
            workers: 2,
            respawn: false,
            ..ClusterConfig::default()
        });
        let pids = start_all(&mut h.pool);

        let delay = h
            .pool
            .on_exit(exit(0, pids[0], WorkerExit::code(1)), Instant::now());
        assert_eq!(delay, None);

        let w0 = h.pool.worker_stats(0, Instant::now()).unwrap();
        assert_eq!(w0.status, WorkerStatus::Crashed);
        assert_eq!(w0.exit_status, 1);
        assert_eq!(w0.pid, 0);
        assert_eq!(w0.crash_count, 0);
        assert_eq!(h.pool.stats().crashed_workers, 1);
        assert_eq!(*h.hooks.exits.lock().unwrap(), vec![(0, 1, true)]);
    }

    #[tokio::test(start_paused = true)]
    async fn clean_exit_is_not_a_crash() {
        let mut h = harness(ClusterConfig {
            workers: 1,
            respawn: true,
            ..ClusterConfig::default()
        });
        let pids = start_all(&mut h.pool);

        let delay = h
            .pool
            .on_exit(exit(0, pids[0], WorkerExit::code(0)), Instant::now());
        assert_eq!(delay, None);

        let w0 = h.pool.worker_stats(0, Instant::now()).unwrap();
        assert_eq!(w0.status, WorkerStatus::Crashed);
        assert_eq!(w0.crash_count, 0);
        assert!(!w0.respawn_disabled);
        assert_eq!(*h.hooks.exits.lock().unwrap(), vec![(0, 0, false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_signals_are_not_crashes_but_others_are() {
        let mut h = harness(ClusterConfig {
            workers: 2,
            respawn: true,
            ..ClusterConfig::default()
        });
        let pids = start_all(&mut h.pool);
        let now = Instant::now();

        let d0 = h
            .pool
            .on_exit(exit(0, pids[0], WorkerExit::signaled(Signal::SIGINT)), now);
        let d1 = h
            .pool
            .on_exit(exit(1, pids[1], WorkerExit::signaled(Signal::SIGSEGV)), now);

        assert_eq!(d0, None);
        assert_eq!(d1, Some(Duration::from_millis(100)));
        assert_eq!(
            *h.hooks.exits.lock().unwrap(),
            vec![(0, 130, false), (1, 139, true)]
        );
        assert_eq!(status_of(&h.pool, 1), WorkerStatus::Respawning);
    }

    #[tokio::test(start_paused = true)]
    async fn third_fast_crash_disables_slot() {
        let mut h = harness(ClusterConfig {
            workers: 1,
            respawn: true,
            max_crashes: 3,
            crash_window: Duration::from_secs(5),
            ..ClusterConfig::default()
        });
        let mut pid = h.pool.spawn(0).unwrap();
        let t0 = Instant::now();

        for (i, at) in [0u64, 700, 1400].into_iter().enumerate() {
            let delay = h.pool.on_exit(
                exit(0, pid, WorkerExit::code(1)),
                t0 + Duration::from_millis(at),
            );
            if i < 2 {
                assert!(delay.is_some());
                h.pool.on_respawn_due(0);
                pid = h.pool.worker_stats(0, Instant::now()).unwrap().pid;
            } else {
                assert_eq!(delay, None);
            }
        }

        let w0 = h.pool.worker_stats(0, Instant::now()).unwrap();
        assert_eq!(w0.status, WorkerStatus::Disabled);
        assert!(w0.respawn_disabled);
        assert_eq!(w0.crash_count, 3);
        assert_eq!(h.pool.stats().disabled_workers, 1);
        assert_eq!(h.pool.stats().total_restarts, 2);
        assert!(!h.pool.any_live());
    }

    #[tokio::test(start_paused = true)]
    async fn spread_out_crashes_keep_respawning() {
        let mut h = harness(ClusterConfig {
            workers: 1,
            respawn: true,
            max_crashes: 2,
            crash_window: Duration::from_secs(1),
            ..ClusterConfig::default()
        });
        let mut pid = h.pool.spawn(0).unwrap();
        let t0 = Instant::now();

        for step in 0..5u64 {
            let delay = h.pool.on_exit(
                exit(0, pid, WorkerExit::code(2)),
                t0 + Duration::from_secs(step * 2),
            );
            assert!(delay.is_some());
            h.pool.on_respawn_due(0);
            pid = h.pool.worker_stats(0, Instant::now()).unwrap().pid;
        }
        assert_eq!(status_of(&h.pool, 0), WorkerStatus::Active);
        assert_eq!(h.pool.stats().total_restarts, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_exit_is_ignored() {
        let mut h = harness(ClusterConfig {
            workers: 1,
            ..ClusterConfig::default()
        });
        let pid = h.pool.spawn(0).unwrap();

        let delay = h
            .pool
            .on_exit(exit(0, pid + 77, WorkerExit::code(1)), Instant::now());
        assert_eq!(delay, None);
        assert_eq!(status_of(&h.pool, 0), WorkerStatus::Active);
        assert!(h.hooks.exits.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_never_respawns() {
        let mut h = harness(ClusterConfig {
            workers: 3,
            respawn: true,
            ..ClusterConfig::default()
        });
        let pids = start_all(&mut h.pool);

        assert!(h.pool.request_shutdown("test"));
        assert!(!h.pool.request_shutdown("again"));
        assert_eq!(status_of(&h.pool, 0), WorkerStatus::Stopping);
        assert_eq!(
            h.launcher
                .signals
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, s)| *s == Signal::SIGTERM)
                .count(),
            3
        );

        for (id, pid) in pids.iter().enumerate() {
            let delay = h
                .pool
                .on_exit(exit(id as u8, *pid, WorkerExit::code(1)), Instant::now());
            assert_eq!(delay, None);
        }
        assert_eq!(status_of(&h.pool, 2), WorkerStatus::Crashed);
        assert!(!h.pool.any_live());
        assert!(h.hooks.exits.lock().unwrap().iter().all(|e| !e.2));
    }

    #[tokio::test(start_paused = true)]
    async fn respawn_timer_during_shutdown_does_not_spawn() {
        let mut h = harness(ClusterConfig {
            workers: 2,
            respawn: true,
            ..ClusterConfig::default()
        });
        let pids = start_all(&mut h.pool);

        assert!(
            h.pool
                .on_exit(exit(0, pids[0], WorkerExit::code(1)), Instant::now())
                .is_some()
        );
        h.pool.request_shutdown("test");
        h.pool.on_respawn_due(0);

        assert_eq!(status_of(&h.pool, 0), WorkerStatus::Crashed);
        assert_eq!(h.launcher.launched.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn graceful_restart_respawns_everyone_then_clears() {
        let mut h = harness(ClusterConfig {
            workers: 3,
            respawn: false,
            ..ClusterConfig::default()
        });
        let pids = start_all(&mut h.pool);

        assert!(h.pool.request_restart());
        assert!(!h.pool.request_restart());
        assert!(h.pool.stats().restart_requested);

        for (id, pid) in pids.iter().enumerate() {
            let delay = h.pool.on_exit(
                exit(id as u8, *pid, WorkerExit::signaled(Signal::SIGTERM)),
                Instant::now(),
            );
            assert!(delay.is_some());
        }
        for id in 0..3 {
            assert!(h.pool.stats().restart_requested);
            h.pool.on_respawn_due(id);
        }

        let stats = h.pool.stats();
        assert!(!stats.restart_requested);
        assert_eq!(stats.active_workers, 3);
        assert_eq!(stats.total_restarts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn signal_all_targets_active_only_and_kill_covers_stopping() {
        let mut h = harness(ClusterConfig {
            workers: 3,
            ..ClusterConfig::default()
        });
        let pids = start_all(&mut h.pool);
        h.pool
            .on_exit(exit(2, pids[2], WorkerExit::code(0)), Instant::now());

        assert_eq!(h.pool.signal_all(Signal::SIGHUP), 2);
        h.pool.request_shutdown("test");
        assert_eq!(h.pool.force_kill_remaining(), vec![0, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn uptime_is_zero_unless_active() {
        let mut h = harness(ClusterConfig {
            workers: 1,
            ..ClusterConfig::default()
        });
        let pid = h.pool.spawn(0).unwrap();
        tokio::time::advance(Duration::from_secs(3)).await;

        let active = h.pool.worker_stats(0, Instant::now()).unwrap();
        assert_eq!(active.uptime, Duration::from_secs(3));

        h.pool
            .on_exit(exit(0, pid, WorkerExit::code(0)), Instant::now());
        let stopped = h.pool.worker_stats(0, Instant::now()).unwrap();
        assert_eq!(stopped.uptime, Duration::ZERO);
        assert!(stopped.start_time.is_some());

        assert!(h.pool.worker_stats(5, Instant::now()).is_none());
        assert_eq!(h.pool.all_worker_stats(0, Instant::now()).len(), 0);
    }
}

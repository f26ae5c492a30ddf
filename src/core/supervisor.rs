//! # Supervisor loop: the master's single owner of worker state.
//!
//! One tokio task runs [`Supervisor::run`]. It performs the staggered startup
//! and then multiplexes every asynchronous input onto the [`Pool`]:
//!
//! ```text
//!   launcher wait tasks ── ExitNotice ──┐
//!   DelayQueue (respawn backoff) ───────┤
//!   SignalListener (TERM/INT/USR2) ─────┼──► select! ──► Pool transition
//!   MasterHandle ── Control ────────────┤
//!   shutdown deadline (sleep_until) ────┘
//! ```
//!
//! ## Startup
//! Spawns slot `0..N` with `startup_delay` between spawns, then sleeps
//! `settle_delay` and publishes `PoolReady`. As soon as more than half of the
//! slots have failed, no further slot is tried: the spawned workers are
//! stopped and drained under the shutdown deadline, and init fails with
//! [`ClusterError::TooManySpawnFailures`].
//!
//! ## Shutdown wait
//! The loop runs while any slot is live. The first iteration that observes a
//! shutdown request arms a deadline of `shutdown_timeout`. When it expires,
//! every active or stopping worker is sent `SIGKILL` and the loop returns
//! [`ClusterError::ShutdownTimeout`] without waiting for them to be reaped.
//! On a normal drain it publishes `AllStopped` and drops all owned resources.

use std::future::pending;

use futures::StreamExt;
use nix::sys::signal::Signal;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep, sleep_until};
use tokio_util::time::DelayQueue;

use crate::core::pool::Pool;
use crate::core::signals::{OsSignal, SignalListener};
use crate::core::stats::{ClusterStats, WorkerStats};
use crate::error::ClusterError;
use crate::events::{Bus, Event, EventKind};
use crate::process::ExitNotice;

/// Requests sent from [`MasterHandle`](crate::MasterHandle) to the loop.
pub(crate) enum Control {
    SignalWorkers {
        signal: Signal,
        reply: oneshot::Sender<usize>,
    },
    Restart {
        reply: oneshot::Sender<bool>,
    },
    Shutdown {
        reply: oneshot::Sender<bool>,
    },
    Stats {
        reply: oneshot::Sender<ClusterStats>,
    },
    WorkerStats {
        id: u8,
        reply: oneshot::Sender<Option<WorkerStats>>,
    },
    AllWorkerStats {
        capacity: usize,
        reply: oneshot::Sender<Vec<WorkerStats>>,
    },
}

pub(crate) struct Supervisor {
    pool: Pool,
    bus: Bus,
    control: mpsc::Receiver<Control>,
    exits: mpsc::UnboundedReceiver<ExitNotice>,
    signals: Option<SignalListener>,
    timers: DelayQueue<u8>,
}

impl Supervisor {
    pub(crate) fn new(
        pool: Pool,
        bus: Bus,
        control: mpsc::Receiver<Control>,
        exits: mpsc::UnboundedReceiver<ExitNotice>,
        signals: Option<SignalListener>,
    ) -> Self {
        Self {
            pool,
            bus,
            control,
            exits,
            signals,
            timers: DelayQueue::new(),
        }
    }

    /// Starts the pool, reports the outcome through `ready`, then supervises
    /// until every worker is gone or the shutdown deadline passes.
    pub(crate) async fn run(
        mut self,
        ready: oneshot::Sender<Result<(), ClusterError>>,
    ) -> Result<(), ClusterError> {
        match self.start_pool().await {
            Ok(()) => {
                let _ = ready.send(Ok(()));
            }
            Err(e) => {
                if let Err(drain) = self.drive().await {
                    tracing::warn!(error = %drain, "startup abort did not drain cleanly");
                }
                let _ = ready.send(Err(e));
                return Ok(());
            }
        }
        self.drive().await
    }

    async fn start_pool(&mut self) -> Result<(), ClusterError> {
        let total = self.pool.worker_count();
        let startup_delay = self.pool.settings().startup_delay;
        let mut failed: u8 = 0;

        for id in 0..total {
            if let Err(e) = self.pool.spawn(id) {
                tracing::error!(worker = id, error = %e, "initial spawn failed");
                failed += 1;
                if u16::from(failed) * 2 > u16::from(total) {
                    self.pool.request_shutdown("startup aborted");
                    return Err(ClusterError::TooManySpawnFailures { failed, total });
                }
            }
            if id + 1 < total {
                sleep(startup_delay).await;
            }
        }

        sleep(self.pool.settings().settle_delay).await;
        let settings = self.pool.settings();
        self.bus.publish(
            Event::new(EventKind::PoolReady)
                .with_port(settings.port)
                .with_reason(format!("workers={}", total - failed)),
        );
        Ok(())
    }

    async fn drive(mut self) -> Result<(), ClusterError> {
        let timeout = self.pool.settings().shutdown_timeout;
        let mut deadline: Option<Instant> = None;
        let mut control_open = true;

        loop {
            if !self.pool.any_live() {
                break;
            }
            if deadline.is_none() && self.pool.shutdown_requested() {
                deadline = Some(Instant::now() + timeout);
            }

            tokio::select! {
                Some(notice) = self.exits.recv() => {
                    if let Some(delay) = self.pool.on_exit(notice, Instant::now()) {
                        self.timers.insert(notice.worker_id, delay);
                    }
                }
                Some(expired) = self.timers.next() => {
                    self.pool.on_respawn_due(expired.into_inner());
                }
                Some(sig) = next_signal(&mut self.signals) => self.on_signal(sig),
                cmd = self.control.recv(), if control_open => match cmd {
                    Some(cmd) => self.on_control(cmd),
                    None => control_open = false,
                },
                () = expire(deadline) => {
                    let killed = self.pool.force_kill_remaining();
                    self.bus.publish(
                        Event::new(EventKind::ShutdownTimeout)
                            .with_delay(timeout)
                            .with_reason(format!("{killed:?}")),
                    );
                    return Err(ClusterError::ShutdownTimeout { timeout, killed });
                }
            }
        }

        self.bus.publish(Event::new(EventKind::AllStopped));
        Ok(())
    }

    fn on_signal(&mut self, sig: OsSignal) {
        if sig.is_shutdown() {
            self.pool.request_shutdown(&sig.to_string());
        } else {
            self.pool.request_restart();
        }
    }

    fn on_control(&mut self, cmd: Control) {
        match cmd {
            Control::SignalWorkers { signal, reply } => {
                let _ = reply.send(self.pool.signal_all(signal));
            }
            Control::Restart { reply } => {
                let _ = reply.send(self.pool.request_restart());
            }
            Control::Shutdown { reply } => {
                let _ = reply.send(self.pool.request_shutdown("requested"));
            }
            Control::Stats { reply } => {
                let _ = reply.send(self.pool.stats());
            }
            Control::WorkerStats { id, reply } => {
                let _ = reply.send(self.pool.worker_stats(id, Instant::now()));
            }
            Control::AllWorkerStats { capacity, reply } => {
                let _ = reply.send(self.pool.all_worker_stats(capacity, Instant::now()));
            }
        }
    }
}

async fn next_signal(signals: &mut Option<SignalListener>) -> Option<OsSignal> {
    match signals {
        Some(listener) => listener.recv().await,
        None => pending().await,
    }
}

async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => pending().await,
    }
}

//! # Roles returned by [`Cluster::init`](crate::Cluster::init).
//!
//! - [`Role::Master`]: this process supervises. Keep the [`Master`] around and
//!   eventually call [`Master::wait`].
//! - [`Role::Worker`]: this process was re-executed as a worker. Bind
//!   [`Worker::port`] (with port reuse) and serve.

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use nix::sys::signal::Signal;

use crate::core::stats::{ClusterStats, WorkerStats};
use crate::core::supervisor::Control;
use crate::error::ClusterError;
use crate::events::{Bus, Event};

/// Outcome of initialization.
#[derive(Debug)]
pub enum Role {
    Master(Master),
    Worker(Worker),
}

impl Role {
    #[inline]
    pub fn is_master(&self) -> bool {
        matches!(self, Role::Master(_))
    }

    #[inline]
    pub fn is_worker(&self) -> bool {
        matches!(self, Role::Worker(_))
    }

    /// Worker slot id; `None` in the master.
    pub fn worker_id(&self) -> Option<u8> {
        match self {
            Role::Master(_) => None,
            Role::Worker(w) => Some(w.id),
        }
    }

    /// Resolved pool size.
    pub fn worker_count(&self) -> u8 {
        match self {
            Role::Master(m) => m.worker_count,
            Role::Worker(w) => w.worker_count,
        }
    }

    /// Shared listening port.
    pub fn port(&self) -> u16 {
        match self {
            Role::Master(m) => m.port,
            Role::Worker(w) => w.port,
        }
    }
}

/// Identity of a worker process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Worker {
    pub(crate) id: u8,
    pub(crate) port: u16,
    pub(crate) worker_count: u8,
}

impl Worker {
    #[inline]
    pub fn id(&self) -> u8 {
        self.id
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[inline]
    pub fn worker_count(&self) -> u8 {
        self.worker_count
    }
}

/// The supervising side of the pool.
pub struct Master {
    pub(crate) handle: MasterHandle,
    pub(crate) join: JoinHandle<Result<(), ClusterError>>,
    pub(crate) bus: Bus,
    pub(crate) stop_listener: CancellationToken,
    pub(crate) listener: Option<JoinHandle<()>>,
    pub(crate) port: u16,
    pub(crate) worker_count: u8,
}

impl std::fmt::Debug for Master {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Master")
            .field("port", &self.port)
            .field("worker_count", &self.worker_count)
            .finish_non_exhaustive()
    }
}

impl Master {
    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[inline]
    pub fn worker_count(&self) -> u8 {
        self.worker_count
    }

    /// Cloneable control handle.
    pub fn handle(&self) -> MasterHandle {
        self.handle.clone()
    }

    /// Raw event stream. Receivers only see events published after this call.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Blocks until the pool has fully drained.
    ///
    /// Returns [`ClusterError::ShutdownTimeout`] when stragglers had to be
    /// killed, and [`ClusterError::Aborted`] if the supervisor task panicked.
    /// Subscribers have received every lifecycle event when this returns.
    pub async fn wait(self) -> Result<(), ClusterError> {
        let result = match self.join.await {
            Ok(res) => res,
            Err(e) => Err(ClusterError::Aborted {
                reason: e.to_string(),
            }),
        };
        self.stop_listener.cancel();
        if let Some(listener) = self.listener {
            let _ = listener.await;
        }
        result
    }
}

/// Control and introspection handle for a running master.
///
/// All calls fail with [`ClusterError::Closed`] once the supervisor loop has
/// exited.
#[derive(Clone, Debug)]
pub struct MasterHandle {
    tx: mpsc::Sender<Control>,
}

impl MasterHandle {
    pub(crate) fn new(tx: mpsc::Sender<Control>) -> Self {
        Self { tx }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Control,
    ) -> Result<T, ClusterError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| ClusterError::Closed)?;
        rx.await.map_err(|_| ClusterError::Closed)
    }

    /// Sends `signal` to every active worker; returns how many were signalled.
    pub async fn signal_workers(&self, signal: Signal) -> Result<usize, ClusterError> {
        self.request(|reply| Control::SignalWorkers { signal, reply })
            .await
    }

    /// Stops every active worker at once and respawns each as it exits.
    ///
    /// Returns `false` when a shutdown or another restart is underway.
    pub async fn graceful_restart(&self) -> Result<bool, ClusterError> {
        self.request(|reply| Control::Restart { reply }).await
    }

    /// Programmatic equivalent of `SIGTERM` to the master.
    ///
    /// Returns `false` if shutdown was already requested.
    pub async fn shutdown(&self) -> Result<bool, ClusterError> {
        self.request(|reply| Control::Shutdown { reply }).await
    }

    pub async fn stats(&self) -> Result<ClusterStats, ClusterError> {
        self.request(|reply| Control::Stats { reply }).await
    }

    /// Snapshot of one slot; `None` for an unknown id.
    pub async fn worker_stats(&self, id: u8) -> Result<Option<WorkerStats>, ClusterError> {
        self.request(|reply| Control::WorkerStats { id, reply })
            .await
    }

    /// Snapshots of up to `capacity` slots, in id order.
    pub async fn all_worker_stats(
        &self,
        capacity: usize,
    ) -> Result<Vec<WorkerStats>, ClusterError> {
        self.request(|reply| Control::AllWorkerStats { capacity, reply })
            .await
    }
}

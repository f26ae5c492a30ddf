//! # Synchronous worker lifecycle hooks.
//!
//! [`WorkerHooks`] is invoked directly on the supervisor loop at the moment a
//! slot's process is created or reaped. Implementations must return quickly
//! and must not block; heavy work belongs in a [`Subscribe`](crate::Subscribe)
//! implementation instead.

/// Callbacks for worker start and exit.
///
/// Both methods default to no-ops.
pub trait WorkerHooks: Send + Sync + 'static {
    /// A process for `worker_id` was created and the slot is active.
    fn on_start(&self, worker_id: u8) {
        let _ = worker_id;
    }

    /// The process for `worker_id` terminated.
    ///
    /// `exit_status` is the exit code, or `128 + signal` for signal deaths.
    /// `is_crash` is false for clean exits and for exits requested by the
    /// supervisor (shutdown, restart).
    fn on_exit(&self, worker_id: u8, exit_status: i32, is_crash: bool) {
        let _ = (worker_id, exit_status, is_crash);
    }
}

/// Hooks that do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoHooks;

impl WorkerHooks for NoHooks {}

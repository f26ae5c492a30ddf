//! Runtime core: pool state, the supervisor loop, and the public entry points.
//!
//! Internal modules:
//! - [`config`]: caller options and their resolution into settings;
//! - [`pool`]: worker table and per-slot state machine;
//! - [`supervisor`]: the loop that owns the pool and multiplexes exits, timers,
//!   signals and control requests;
//! - [`signals`]: master signal subscriptions;
//! - [`master`]: roles and the master control handle;
//! - [`builder`]: [`Cluster`] and [`ClusterBuilder`];
//! - [`stats`]: read-only snapshots.

mod builder;
mod config;
mod master;
mod pool;
mod signals;
mod stats;
mod supervisor;

pub use builder::{Cluster, ClusterBuilder};
pub use config::{ClusterConfig, Settings};
pub use master::{Master, MasterHandle, Role, Worker};
pub use stats::{ClusterStats, WorkerStats, WorkerStatus};

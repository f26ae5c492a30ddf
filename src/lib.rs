//! # procvisor
//!
//! **Procvisor** turns one executable into a same-machine pool of worker
//! processes that share a listening port, and supervises them: staggered
//! startup, crash detection, bounded automatic respawn, graceful restart and
//! bounded-time shutdown.
//!
//! The binary re-executes itself once per worker, tagging each child's
//! arguments with `--cluster-worker <id> <port>`. [`Cluster::init`] detects
//! the tag and hands back a [`Role`]: the master supervises, workers serve.
//!
//! ## Architecture
//! ```text
//!                       ┌───────────────────────── master ─────────────────────────┐
//!                       │                                                          │
//!  MasterHandle ────────┼─► Control ─┐                                             │
//!  SIGTERM/SIGINT/USR2 ─┼─► Signals ─┤                                             │
//!                       │            ▼                                             │
//!                       │   ┌──────────────────┐  launch / signal  ┌────────────┐  │
//!                       │   │ Supervisor loop  │──────────────────►│  Launcher  │──┼──► worker 0..N-1
//!                       │   │  (owns the Pool) │◄──── ExitNotice ──│ wait tasks │◄─┼─── exit status
//!                       │   └───┬──────────┬───┘                   └────────────┘  │
//!                       │       │          └──► DelayQueue (respawn backoff)       │
//!                       │       ▼                                                  │
//!                       │   Bus (broadcast) ──► SubscriberSet ──► Subscribe impls  │
//!                       └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Worker slot lifecycle
//! ```text
//! Starting ──► Active ──► Stopping ──► exit ─┬─► Respawning ──► Starting
//!    │                                       ├─► Crashed
//!    └──► Disabled ◄─────────────────────────┴─► Disabled (crash loop)
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types                               |
//! |-------------------|----------------------------------------------------------|-----------------------------------------|
//! | **Entry point**   | Role detection, pool startup                             | [`Cluster`], [`ClusterBuilder`], [`Role`] |
//! | **Control**       | Signals, graceful restart, shutdown, stats               | [`Master`], [`MasterHandle`]            |
//! | **Policies**      | Crash-loop detection                                     | [`CrashLoopPolicy`], [`CrashHistory`]   |
//! | **Observability** | Lifecycle events and callbacks                           | [`Subscribe`], [`WorkerHooks`], [`Event`] |
//! | **Processes**     | Re-exec protocol and process backend                     | [`process::Launcher`], [`process::ReexecArgs`] |
//! | **Configuration** | Options with zero-means-default sentinels                | [`ClusterConfig`]                       |
//!
//! ## Optional features
//! - `logging`: exports the [`LogWriter`] subscriber, which renders events via `tracing`.
//!
//! ## Example
//! ```no_run
//! use procvisor::{Cluster, ClusterConfig, Role};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = ClusterConfig {
//!         port: 8080,
//!         respawn: true,
//!         ..ClusterConfig::default()
//!     };
//!
//!     match Cluster::builder(cfg).build().init(std::env::args_os()).await? {
//!         Role::Master(master) => {
//!             println!("supervising {} workers on :{}", master.worker_count(), master.port());
//!             master.wait().await?;
//!         }
//!         Role::Worker(worker) => {
//!             // Bind worker.port() with SO_REUSEPORT and serve until SIGTERM.
//!             let _ = worker;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

#[cfg(not(unix))]
compile_error!("procvisor supervises OS processes with POSIX signals and supports unix targets only");

mod core;
mod error;
mod events;
mod policies;
pub mod process;
mod subscribers;
pub mod topology;

// ---- Public re-exports ----

pub use crate::core::{
    Cluster, ClusterBuilder, ClusterConfig, ClusterStats, Master, MasterHandle, Role, Settings,
    Worker, WorkerStats, WorkerStatus,
};
pub use error::{ClusterError, SpawnError};
pub use events::{Bus, Event, EventKind};
pub use nix::sys::signal::Signal;
pub use policies::{CrashHistory, CrashLoopPolicy, MAX_TRACKED_CRASHES, RespawnVerdict};
pub use process::WorkerExit;
pub use subscribers::{NoHooks, Subscribe, SubscriberSet, WorkerHooks};

// Optional: built-in tracing subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

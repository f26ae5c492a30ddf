//! OS process plumbing: re-exec protocol, launching, naming.
//!
//! ## Contents
//! - [`args`]: worker tag detection and argument/environment building;
//! - [`launcher`]: the [`Launcher`] seam and its tokio implementation;
//! - [`title`]: best-effort process titles.

mod args;
mod launcher;
mod title;

pub use args::{
    Invocation, ReexecArgs, WORKER_ENV, WORKER_FLAG, WorkerCommand, detect_role, is_worker_env,
    strip_worker_tags,
};
pub use launcher::{ExitNotice, ExitSender, Launcher, TokioLauncher, WorkerExit};
pub(crate) use title::{app_name_from, master_title, set_process_title, worker_title};

//! # Event consumers and worker lifecycle hooks.
//!
//! ```text
//! Supervisor ── publish(Event) ──► Bus ──► SubscriberSet ──┬──► [queue] ──► LogWriter
//!                                                          └──► [queue] ──► custom
//!
//! Supervisor ── on_start / on_exit ──► WorkerHooks (inline, on the supervisor task)
//! ```
//!
//! - [`Subscribe`] is the async, queue-isolated observer interface.
//! - [`WorkerHooks`] are synchronous callbacks invoked in-line when a worker
//!   starts or exits; keep them short.

mod hooks;
#[cfg(feature = "logging")]
mod log;
mod subscribe;
mod subscriber_set;

pub use hooks::{NoHooks, WorkerHooks};
#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;

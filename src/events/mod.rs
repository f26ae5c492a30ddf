//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `core::pool::Pool` (worker lifecycle), `core::supervisor`
//!   (pool lifecycle), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the fan-out listener started by `Cluster::init`, and
//!   receivers handed out by `Master::events`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};

//! Respawn policies.
//!
//! This module groups the knobs that control **whether** a crashed worker slot
//! is relaunched.
//!
//! ## Contents
//! - [`CrashLoopPolicy`] at most `max_crashes` crashes per `window`
//! - [`CrashHistory`] fixed-capacity ring of recent crash instants per slot
//! - [`RespawnVerdict`] outcome of evaluating one crash
//!
//! ## Quick wiring
//! ```text
//! Settings { respawn, crash_policy, respawn_delay }
//!      └─► core::pool::Pool uses:
//!           - crash_policy.evaluate(&mut record.history, now) on every crash
//!           - respawn_delay to arm the one-shot respawn timer
//! ```
//!
//! ## Defaults
//! - `max_crashes = 3` (capped at 10), `crash_window = 5s`.

mod crash_loop;

pub use crash_loop::{CrashHistory, CrashLoopPolicy, MAX_TRACKED_CRASHES, RespawnVerdict};

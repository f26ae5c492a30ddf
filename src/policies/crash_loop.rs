//! # Crash-loop detection for worker slots.
//!
//! [`CrashLoopPolicy`] decides whether a crashed slot may be respawned. Each
//! slot keeps a [`CrashHistory`]: a fixed-capacity ring of the most recent crash
//! instants. Capacity is `min(max_crashes, 10)`.
//!
//! ```text
//! crash at t ──► history full? ──yes──► evict oldest
//!                     │                      │
//!                     └──────────┬───────────┘
//!                                ▼
//!                           append t
//!                                ▼
//!           full && (newest - oldest) < window ?
//!                 ├─ yes ─► RespawnVerdict::CrashLoop (slot disabled for good)
//!                 └─ no  ─► RespawnVerdict::Approved
//! ```
//!
//! The verdict is a pure function of the crash instants, the capacity and the
//! window.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use procvisor::{CrashHistory, CrashLoopPolicy, RespawnVerdict};
//!
//! let policy = CrashLoopPolicy::new(3, Duration::from_secs(5));
//! let mut history = CrashHistory::new(policy.capacity());
//! let t0 = Instant::now();
//!
//! assert_eq!(policy.evaluate(&mut history, t0), RespawnVerdict::Approved);
//! assert_eq!(policy.evaluate(&mut history, t0 + Duration::from_secs(1)), RespawnVerdict::Approved);
//! assert!(matches!(
//!     policy.evaluate(&mut history, t0 + Duration::from_secs(2)),
//!     RespawnVerdict::CrashLoop { crashes: 3, .. }
//! ));
//! ```

use std::time::Duration;

use tokio::time::Instant;

/// Hard upper bound on tracked crashes per slot.
pub const MAX_TRACKED_CRASHES: usize = 10;

/// Fixed-capacity ring of recent crash instants (oldest evicted first).
#[derive(Clone, Debug)]
pub struct CrashHistory {
    times: [Option<Instant>; MAX_TRACKED_CRASHES],
    head: usize,
    len: usize,
    capacity: usize,
}

impl CrashHistory {
    /// Creates an empty history; `capacity` is clamped to `1..=10`.
    pub fn new(capacity: usize) -> Self {
        Self {
            times: [None; MAX_TRACKED_CRASHES],
            head: 0,
            len: 0,
            capacity: capacity.clamp(1, MAX_TRACKED_CRASHES),
        }
    }

    /// Appends a crash instant, evicting the oldest entry when full.
    pub fn record(&mut self, at: Instant) {
        if self.len == self.capacity {
            self.times[self.head] = Some(at);
            self.head = (self.head + 1) % self.capacity;
        } else {
            let idx = (self.head + self.len) % self.capacity;
            self.times[idx] = Some(at);
            self.len += 1;
        }
    }

    /// Number of recorded crashes (never exceeds capacity).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Oldest recorded crash.
    pub fn oldest(&self) -> Option<Instant> {
        if self.len == 0 {
            return None;
        }
        self.times[self.head]
    }

    /// Most recent recorded crash.
    pub fn newest(&self) -> Option<Instant> {
        if self.len == 0 {
            return None;
        }
        self.times[(self.head + self.len - 1) % self.capacity]
    }

    /// Time between the oldest and newest recorded crash.
    pub fn span(&self) -> Option<Duration> {
        Some(self.newest()?.saturating_duration_since(self.oldest()?))
    }

    /// Recorded instants, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = Instant> + '_ {
        (0..self.len).filter_map(move |i| self.times[(self.head + i) % self.capacity])
    }
}

/// Outcome of evaluating a crash against the policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RespawnVerdict {
    /// The slot may be respawned.
    Approved,
    /// `crashes` crashes happened within `span`, shorter than the window.
    CrashLoop {
        /// Number of crashes in the history (equals capacity).
        crashes: usize,
        /// Time between oldest and newest crash.
        span: Duration,
    },
}

/// Crash-loop threshold: at most `max_crashes` crashes per `window`.
#[derive(Clone, Copy, Debug)]
pub struct CrashLoopPolicy {
    max_crashes: usize,
    window: Duration,
}

impl CrashLoopPolicy {
    /// Creates a policy; `max_crashes` is clamped to `1..=10`.
    pub fn new(max_crashes: u8, window: Duration) -> Self {
        Self {
            max_crashes: usize::from(max_crashes).clamp(1, MAX_TRACKED_CRASHES),
            window,
        }
    }

    /// Capacity each slot's [`CrashHistory`] should be created with.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.max_crashes
    }

    #[inline]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a crash at `at` and decides whether the slot may respawn.
    pub fn evaluate(&self, history: &mut CrashHistory, at: Instant) -> RespawnVerdict {
        history.record(at);

        if !history.is_full() {
            return RespawnVerdict::Approved;
        }
        match history.span() {
            Some(span) if span < self.window => RespawnVerdict::CrashLoop {
                crashes: history.len(),
                span,
            },
            _ => RespawnVerdict::Approved,
        }
    }
}

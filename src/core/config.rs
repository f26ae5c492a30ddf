//! # Cluster configuration.
//!
//! [`ClusterConfig`] is the caller-facing options struct. It is resolved once,
//! at [`Cluster::init`](crate::Cluster::init), into immutable [`Settings`].
//!
//! ## Sentinel values
//! Zero means "use the documented default" for every optional field:
//! - `workers = 0` → number of logical cores
//! - `shutdown_timeout = 0s` → 15s
//! - `crash_window = 0s` → 5s
//! - `max_crashes = 0` → 3 (values above 10 are capped at 10)
//! - `startup_delay = 0s` → 100ms
//! - `respawn_delay = 0s` → 100ms
//! - `settle_delay = 0s` → 500ms
//! - `bus_capacity = 0` → 1
//! - `name = ""` → executable file stem
//!
//! `port` has no default: zero is rejected with
//! [`ClusterError::MissingPort`].

use std::time::Duration;

use crate::error::ClusterError;
use crate::policies::{CrashLoopPolicy, MAX_TRACKED_CRASHES};

pub(crate) const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(15);
pub(crate) const DEFAULT_CRASH_WINDOW: Duration = Duration::from_secs(5);
pub(crate) const DEFAULT_MAX_CRASHES: u8 = 3;
pub(crate) const DEFAULT_STARTUP_DELAY: Duration = Duration::from_millis(100);
pub(crate) const DEFAULT_RESPAWN_DELAY: Duration = Duration::from_millis(100);
pub(crate) const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Options for a worker pool.
///
/// ## Field semantics
/// - `workers`: pool size (`0` = one per logical core)
/// - `port`: shared listening port handed to every worker (required)
/// - `respawn`: relaunch crashed workers, subject to crash-loop detection
/// - `shutdown_timeout`: how long shutdown waits before killing stragglers
/// - `crash_window` / `max_crashes`: crash-loop threshold
/// - `startup_delay`: pause between initial spawns
/// - `respawn_delay`: backoff before relaunching a slot
/// - `settle_delay`: pause after the last initial spawn before reporting ready
/// - `bus_capacity`: event bus ring size
/// - `name`: application name used in process titles
#[derive(Clone, Debug)]
pub struct ClusterConfig {
    pub workers: u8,
    pub port: u16,
    pub respawn: bool,
    pub shutdown_timeout: Duration,
    pub crash_window: Duration,
    pub max_crashes: u8,
    pub startup_delay: Duration,
    pub respawn_delay: Duration,
    pub settle_delay: Duration,
    pub bus_capacity: usize,
    pub name: String,
}

impl Default for ClusterConfig {
    /// All sentinels, `respawn = false`, `bus_capacity = 1024`, no port.
    fn default() -> Self {
        Self {
            workers: 0,
            port: 0,
            respawn: false,
            shutdown_timeout: Duration::ZERO,
            crash_window: Duration::ZERO,
            max_crashes: 0,
            startup_delay: Duration::ZERO,
            respawn_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
            bus_capacity: 1024,
            name: String::new(),
        }
    }
}

impl ClusterConfig {
    /// Applies defaults and validates.
    ///
    /// `logical_cores` sizes the pool when `workers == 0`.
    pub fn resolve(&self, logical_cores: u8) -> Result<Settings, ClusterError> {
        if self.port == 0 {
            return Err(ClusterError::MissingPort);
        }
        let logical_cores = logical_cores.max(1);
        let workers = if self.workers == 0 {
            logical_cores
        } else {
            self.workers
        };
        if u16::from(workers) > u16::from(logical_cores) * 2 {
            tracing::warn!(
                workers,
                logical_cores,
                "worker count exceeds twice the logical core count"
            );
        }

        let max_crashes = match self.max_crashes {
            0 => DEFAULT_MAX_CRASHES,
            n => n.min(MAX_TRACKED_CRASHES as u8),
        };

        Ok(Settings {
            workers,
            port: self.port,
            respawn: self.respawn,
            shutdown_timeout: or_default(self.shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT),
            crash_policy: CrashLoopPolicy::new(
                max_crashes,
                or_default(self.crash_window, DEFAULT_CRASH_WINDOW),
            ),
            startup_delay: or_default(self.startup_delay, DEFAULT_STARTUP_DELAY),
            respawn_delay: or_default(self.respawn_delay, DEFAULT_RESPAWN_DELAY),
            settle_delay: or_default(self.settle_delay, DEFAULT_SETTLE_DELAY),
            bus_capacity: self.bus_capacity.max(1),
            name: self.name.clone(),
        })
    }
}

#[inline]
fn or_default(value: Duration, default: Duration) -> Duration {
    if value.is_zero() { default } else { value }
}

/// Resolved, immutable configuration.
#[derive(Clone, Debug)]
pub struct Settings {
    pub workers: u8,
    pub port: u16,
    pub respawn: bool,
    pub shutdown_timeout: Duration,
    pub crash_policy: CrashLoopPolicy,
    pub startup_delay: Duration,
    pub respawn_delay: Duration,
    pub settle_delay: Duration,
    pub bus_capacity: usize,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_port() -> ClusterConfig {
        ClusterConfig {
            port: 8080,
            ..ClusterConfig::default()
        }
    }

    #[test]
    fn port_is_required() {
        let err = ClusterConfig::default().resolve(4).unwrap_err();
        assert!(matches!(err, ClusterError::MissingPort));
    }

    #[test]
    fn zero_values_resolve_to_defaults() {
        let s = with_port().resolve(6).unwrap();
        assert_eq!(s.workers, 6);
        assert_eq!(s.port, 8080);
        assert!(!s.respawn);
        assert_eq!(s.shutdown_timeout, Duration::from_secs(15));
        assert_eq!(s.crash_policy.window(), Duration::from_secs(5));
        assert_eq!(s.crash_policy.capacity(), 3);
        assert_eq!(s.startup_delay, Duration::from_millis(100));
        assert_eq!(s.respawn_delay, Duration::from_millis(100));
        assert_eq!(s.settle_delay, Duration::from_millis(500));
    }

    #[test]
    fn worker_count_is_never_zero() {
        let s = with_port().resolve(0).unwrap();
        assert_eq!(s.workers, 1);
    }

    #[test]
    fn explicit_values_win_and_crashes_are_capped() {
        let cfg = ClusterConfig {
            workers: 12,
            max_crashes: 40,
            shutdown_timeout: Duration::from_millis(100),
            respawn: true,
            ..with_port()
        };
        let s = cfg.resolve(2).unwrap();
        assert_eq!(s.workers, 12);
        assert_eq!(s.crash_policy.capacity(), 10);
        assert_eq!(s.shutdown_timeout, Duration::from_millis(100));
        assert!(s.respawn);
    }
}

//! # Master signal subscriptions.
//!
//! The master listens for three signals:
//! - `SIGTERM` and `SIGINT` → shutdown
//! - `SIGUSR2` → graceful restart
//!
//! Listeners are registered once at init and polled by the supervisor loop, so
//! every signal is handled on the same task that owns worker state.

use std::fmt;

use tokio::signal::unix::{Signal, SignalKind, signal};

/// A signal the master reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OsSignal {
    Terminate,
    Interrupt,
    Restart,
}

impl OsSignal {
    /// True for the signals that request shutdown.
    #[inline]
    pub fn is_shutdown(self) -> bool {
        matches!(self, OsSignal::Terminate | OsSignal::Interrupt)
    }
}

impl fmt::Display for OsSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OsSignal::Terminate => "SIGTERM",
            OsSignal::Interrupt => "SIGINT",
            OsSignal::Restart => "SIGUSR2",
        })
    }
}

/// Registered signal streams.
pub struct SignalListener {
    term: Signal,
    int: Signal,
    usr2: Signal,
}

impl SignalListener {
    /// Registers all three listeners. Must be called inside a tokio runtime.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            term: signal(SignalKind::terminate())?,
            int: signal(SignalKind::interrupt())?,
            usr2: signal(SignalKind::user_defined2())?,
        })
    }

    /// Waits for the next signal. Returns `None` once the streams are closed.
    pub async fn recv(&mut self) -> Option<OsSignal> {
        tokio::select! {
            s = self.term.recv() => s.map(|()| OsSignal::Terminate),
            s = self.int.recv()  => s.map(|()| OsSignal::Interrupt),
            s = self.usr2.recv() => s.map(|()| OsSignal::Restart),
        }
    }
}

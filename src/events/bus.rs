//! # Event bus for supervisor events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. The supervisor
//! loop and the subscriber fan-out publish into it; the fan-out listener and any
//! caller of [`Master::events`](crate::Master::events) read from it.
//!
//! ```text
//! Pool / Supervisor loop ──┐
//!                          ├──► Bus ──► listener ──► SubscriberSet
//! SubscriberSet workers ───┘     └────► Master::events() receivers
//! ```
//!
//! ## Rules
//! - `publish()` never blocks; events without receivers are dropped.
//! - Slow receivers observe `RecvError::Lagged(n)` and skip `n` oldest events.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events (cheap to clone).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_see_later_events_only() {
        let bus = Bus::new(8);
        bus.publish(Event::new(EventKind::PoolReady));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::AllStopped).with_worker(1));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::AllStopped);
        assert_eq!(ev.worker, Some(1));
    }
}

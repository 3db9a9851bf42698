//! # Event bus shared by a task tree.
//!
//! A root task built with `.bus(bus)` hands the same [`Bus`] to every sub-task
//! it creates, so one receiver sees the whole tree.
//!
//! ```text
//!   Task (root) ──┐
//!   SubTask     ──┼── publish ──► Bus ──► SubscriberSet::listen ──► subscribers
//!   SubscriberSet ┘  (broadcast)      └─► any Bus::subscribe() receiver
//! ```
//!
//! ## Rules
//! - Publishing never blocks and needs no runtime, so tasks can publish from
//!   executor threads and from inline runs alike.
//! - Receivers only see events sent after they subscribed.
//! - A receiver lagging more than the capacity loses the oldest events
//!   (`RecvError::Lagged`).

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle to a bounded broadcast channel of [`Event`]s.
#[derive(Clone, Debug)]
pub struct Bus {
    sender: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus keeping at most `capacity` (min 1) undelivered events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Sends `ev` to every current receiver and returns how many there were.
    ///
    /// Without receivers the event is dropped.
    pub fn publish(&self, ev: Event) -> usize {
        self.sender.send(ev).unwrap_or(0)
    }

    /// Whether anyone would receive a published event.
    ///
    /// Tasks check this before building events.
    pub fn has_receivers(&self) -> bool {
        self.sender.receiver_count() > 0
    }

    /// Opens a new, independent receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn publish_without_receivers_reaches_nobody() {
        let bus = Bus::new(0);
        assert!(!bus.has_receivers());
        assert_eq!(bus.publish(Event::new(EventKind::TaskStarting)), 0);
    }

    #[test]
    fn receivers_only_see_later_events() {
        let bus = Bus::new(8);
        bus.publish(Event::new(EventKind::TaskScheduled));

        let mut rx = bus.subscribe();
        let other = bus.subscribe();
        assert!(bus.has_receivers());
        assert_eq!(bus.publish(Event::new(EventKind::TaskCompleted).with_task("a")), 2);
        drop(other);

        let ev = rx.try_recv().expect("event");
        assert_eq!(ev.kind, EventKind::TaskCompleted);
        assert!(rx.try_recv().is_err());
    }
}

//! # Non-blocking event fan-out to multiple subscribers.
//!
//! Provides [`SubscriberSet`], which distributes task events to multiple
//! subscribers concurrently without blocking the publishing task.
//!
//! ## Architecture
//! ```text
//! Bus ──► listener ──► emit_arc(event)
//!                          │
//!                          ├──► [queue 1] ──► worker 1 ──► subscriber1.on_event()
//!                          │    (bounded)         └──────► panic → SubscriberPanicked
//!                          ├──► [queue 2] ──► worker 2 ──► subscriber2.on_event()
//!                          └──► [queue N] ──► worker N ──► subscriberN.on_event()
//! ```
//!
//! ## Rules
//! - **No cross-subscriber ordering**: subscriber A may process event N while B processes N+5
//! - **Overflow**: event dropped for that subscriber only, `SubscriberOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Isolation**: a slow or panicking subscriber doesn't affect others
//! - **Per-subscriber FIFO**: each subscriber sees events in order
//!
//! ## Panic handling
//! Worker tasks use `catch_unwind`: the panic is converted into a
//! `SubscriberPanicked` event and the worker moves on to the next event. A panic
//! while handling a subscriber event is only logged.
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a subscriber panics while holding a lock.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tasktree::{Bus, Event, Subscribe, SubscriberSet};
//!
//! struct Metrics;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for Metrics {
//!     async fn on_event(&self, _ev: &Event) {}
//!     fn name(&self) -> &'static str { "metrics" }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = Bus::new(64);
//! let mut set = SubscriberSet::new(vec![Arc::new(Metrics) as Arc<dyn Subscribe>], bus.clone());
//! set.listen();
//! // ... build tasks with `.bus(bus.clone())` ...
//! set.shutdown().await;
//! # }
//! ```

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::error::panic_message;
use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

/// Queue feeding one subscriber's worker.
struct SubscriberChannel {
    sub: Arc<dyn Subscribe>,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Queues of every subscriber plus the bus overflow is reported on.
struct Fanout {
    channels: Vec<SubscriberChannel>,
    bus: Bus,
}

impl Fanout {
    fn emit_arc(&self, event: Arc<Event>) {
        // Trouble delivering a subscriber event is never reported again.
        let reportable = !event.kind.is_subscriber_event();

        for channel in &self.channels {
            if !channel.sub.interested(event.kind) {
                continue;
            }
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            let name = channel.sub.name();
            trace!(subscriber = name, reason, "event dropped for subscriber");
            if reportable {
                self.bus.publish(Event::subscriber_overflow(name, reason));
            }
        }
    }
}

/// Worker loop of one subscriber: runs until its queue is closed.
///
/// A panic is published as `SubscriberPanicked`, except while handling a
/// subscriber event: those panics are only logged.
async fn drive(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let fut = sub.on_event(ev.as_ref());
        let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await else {
            continue;
        };

        let info = panic_message(&*panic_err);
        warn!(subscriber = sub.name(), kind = ?ev.kind, panic = %info, "subscriber panicked");
        if !ev.kind.is_subscriber_event() {
            bus.publish(Event::subscriber_panicked(sub.name(), info));
        }
    }
}

/// Fan-out coordinator for multiple event subscribers.
///
/// Manages per-subscriber queues and worker tasks, providing:
/// - **Concurrent delivery**: events sent to all subscribers simultaneously
/// - **Isolation**: each subscriber has a dedicated queue and worker
/// - **Panic safety**: panics caught and reported, don't crash the runtime
/// - **Overflow handling**: dropped events reported via `SubscriberOverflow`
///
/// Must be created inside a tokio runtime.
pub struct SubscriberSet {
    fanout: Arc<Fanout>,
    workers: Vec<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker task per subscriber.
    ///
    /// ### Per-subscriber setup
    /// - Bounded mpsc queue (capacity from [`Subscribe::queue_capacity`], min 1)
    /// - Dedicated worker task (runs until the queue is closed)
    /// - Panic isolation via `catch_unwind`
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            workers.push(tokio::spawn(drive(Arc::clone(&sub), rx, bus.clone())));
            channels.push(SubscriberChannel { sub, sender: tx });
        }

        Self {
            fanout: Arc::new(Fanout { channels, bus }),
            workers,
            listener: None,
        }
    }

    /// Starts forwarding every event published on the set's bus to the
    /// subscribers. Calling it again has no effect.
    pub fn listen(&mut self) {
        if self.listener.is_some() {
            return;
        }

        let mut rx = self.fanout.bus.subscribe();
        let fanout = Arc::clone(&self.fanout);
        self.listener = Some(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => fanout.emit_arc(Arc::new(ev)),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "subscriber listener lagged behind the bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    /// Emits an event to all subscribers (clones the event).
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a pre-allocated `Arc<Event>` to all subscribers.
    ///
    /// - Uses `try_send` (non-blocking)
    /// - Skips subscribers whose [`Subscribe::interested`] rejects the kind
    /// - On queue full or closed: drops the event for that subscriber and publishes
    ///   `SubscriberOverflow` (subscriber events themselves are never re-reported)
    pub fn emit_arc(&self, event: Arc<Event>) {
        self.fanout.emit_arc(event);
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fanout.channels.len()
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fanout.channels.is_empty()
    }

    /// Gracefully shuts down all subscriber workers.
    ///
    /// 1. Stops the bus listener (if any)
    /// 2. Drops all channel senders (workers drain their queue, then stop)
    /// 3. Awaits all worker tasks
    pub async fn shutdown(mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            let _ = listener.await;
        }
        drop(self.fanout);

        for h in self.workers {
            let _ = h.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::Semaphore;

    use super::*;
    use crate::Task;
    use crate::events::EventKind;
    use crate::test_utils::Value;

    #[derive(Default)]
    struct Collect {
        seen: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().push(event.kind);
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    #[derive(Default)]
    struct Explode {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_event(&self, _event: &Event) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            panic!("subscriber blew up");
        }

        fn name(&self) -> &'static str {
            "explode"
        }
    }

    /// Only wants failures.
    #[derive(Default)]
    struct FailuresOnly {
        seen: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl Subscribe for FailuresOnly {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().push(event.kind);
        }

        fn interested(&self, kind: EventKind) -> bool {
            kind == EventKind::TaskFailed
        }
    }

    /// Blocks every event until the gate opens.
    struct Stuck {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl Subscribe for Stuck {
        async fn on_event(&self, _event: &Event) {
            let _open = self.gate.acquire().await;
        }

        fn name(&self) -> &'static str {
            "stuck"
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    async fn until(mut cond: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn emit_reaches_every_subscriber_in_order() {
        let a = Collect::default();
        let b = Collect::default();
        let (seen_a, seen_b) = (Arc::clone(&a.seen), Arc::clone(&b.seen));

        let set = SubscriberSet::new(
            vec![Arc::new(a) as Arc<dyn Subscribe>, Arc::new(b) as Arc<dyn Subscribe>],
            Bus::new(8),
        );
        assert_eq!(set.len(), 2);

        set.emit(&Event::new(EventKind::TaskStarting));
        set.emit(&Event::new(EventKind::TaskCompleted));
        set.shutdown().await;

        let expected = vec![EventKind::TaskStarting, EventKind::TaskCompleted];
        assert_eq!(*seen_a.lock(), expected);
        assert_eq!(*seen_b.lock(), expected);
    }

    #[tokio::test]
    async fn panicking_subscriber_is_reported() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(
            vec![Arc::new(Explode::default()) as Arc<dyn Subscribe>],
            bus.clone(),
        );

        set.emit(&Event::new(EventKind::TaskStarting));
        set.shutdown().await;

        let ev = rx.recv().await.expect("panic event");
        assert!(ev.is_subscriber_panic());
        assert_eq!(ev.task.as_deref(), Some("explode"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber blew up"));
    }

    #[tokio::test]
    async fn panic_reports_do_not_feed_back_into_the_subscriber() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let sub = Explode::default();
        let calls = Arc::clone(&sub.calls);

        let mut set = SubscriberSet::new(vec![Arc::new(sub) as Arc<dyn Subscribe>], bus.clone());
        set.listen();
        bus.publish(Event::new(EventKind::TaskCompleted));

        // Once for the task event, once for its own panic report.
        until(|| calls.load(Ordering::SeqCst) >= 2).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        set.shutdown().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let mut panics = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.is_subscriber_panic() {
                panics += 1;
            }
        }
        assert_eq!(panics, 1);
    }

    #[tokio::test]
    async fn uninterested_subscribers_are_skipped() {
        let sub = FailuresOnly::default();
        let seen = Arc::clone(&sub.seen);
        let set = SubscriberSet::new(vec![Arc::new(sub) as Arc<dyn Subscribe>], Bus::new(8));

        set.emit(&Event::new(EventKind::TaskStarting));
        set.emit(&Event::new(EventKind::TaskFailed).with_reason("boom"));
        set.emit(&Event::new(EventKind::TaskCompleted));
        set.shutdown().await;

        assert_eq!(*seen.lock(), vec![EventKind::TaskFailed]);
    }

    #[tokio::test]
    async fn full_queue_reports_overflow() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let gate = Arc::new(Semaphore::new(0));
        let set = SubscriberSet::new(
            vec![Arc::new(Stuck {
                gate: Arc::clone(&gate),
            }) as Arc<dyn Subscribe>],
            bus.clone(),
        );

        // One event in flight, one queued, the rest overflow.
        for _ in 0..4 {
            set.emit(&Event::new(EventKind::TaskStarting));
            tokio::task::yield_now().await;
        }

        let ev = rx.recv().await.expect("overflow event");
        assert!(ev.is_subscriber_overflow());
        assert!(ev.reason.as_deref().is_some_and(|r| r.contains("reason=full")));

        gate.add_permits(1);
        set.shutdown().await;
    }

    #[tokio::test]
    async fn listener_forwards_task_events() {
        let bus = Bus::new(64);
        let sub = Collect::default();
        let seen = Arc::clone(&sub.seen);

        let mut set = SubscriberSet::new(vec![Arc::new(sub) as Arc<dyn Subscribe>], bus.clone());
        set.listen();
        set.listen();

        let task = Task::builder(Value(1)).bus(bus.clone()).build();
        task.run().expect("run");

        until(|| seen.lock().contains(&EventKind::TaskCompleted)).await;
        set.shutdown().await;

        let seen = seen.lock();
        assert_eq!(seen.iter().filter(|k| **k == EventKind::TaskCompleted).count(), 1);
        assert!(seen.iter().all(|k| !k.is_subscriber_event()));
    }
}

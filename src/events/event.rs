//! # Lifecycle events emitted by tasks.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Lifecycle events**: scheduling, execution and completion of a task
//! - **Ownership events**: sub-task creation and teardown-driven cancellation
//! - **Diagnostics**: contract violations and subscriber trouble
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task
//! name and id, the parent id and a reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use tasktree::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_task("fetch")
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.task.as_deref(), Some("fetch"));
//! assert_eq!(ev.reason.as_deref(), Some("connection refused"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::tasks::TaskId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of task events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Task lifecycle events ===
    /// Task was handed to its executor.
    ///
    /// Sets:
    /// - `task`, `task_id`
    /// - `reason`: executor name
    TaskScheduled,

    /// Task work is about to execute (inline or on an executor thread).
    ///
    /// Sets:
    /// - `task`, `task_id`
    TaskStarting,

    /// Task completed with `Ok`.
    ///
    /// Sets:
    /// - `task`, `task_id`
    TaskCompleted,

    /// Task completed with `Err`.
    ///
    /// Sets:
    /// - `task`, `task_id`
    /// - `reason`: error message
    TaskFailed,

    // === Ownership events ===
    /// A sub-task was created and adopted by its parent.
    ///
    /// Sets:
    /// - `task`, `task_id`: the new sub-task
    /// - `parent`: id of the owning task
    SubTaskCreated,

    /// A dropped task asked its executor to cancel it.
    ///
    /// Sets:
    /// - `task`, `task_id`
    /// - `reason`: executor name
    CancelRequested,

    // === Diagnostics ===
    /// The executor bound to a task was found dropped.
    ///
    /// Sets:
    /// - `task`, `task_id`
    /// - `reason`: the operation that noticed it ("run" or "drop")
    ExecutorGone,

    /// A second completion was rejected.
    ///
    /// Sets:
    /// - `task`, `task_id`
    CompletionRejected,
}

impl EventKind {
    /// Whether the event was produced by the subscriber machinery itself.
    pub fn is_subscriber_event(&self) -> bool {
        matches!(self, EventKind::SubscriberOverflow | EventKind::SubscriberPanicked)
    }
}

/// Task event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Id of the task, if applicable.
    pub task_id: Option<TaskId>,
    /// Id of the owning task (sub-task events only).
    pub parent: Option<TaskId>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            task_id: None,
            parent: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task_id(mut self, id: TaskId) -> Self {
        self.task_id = Some(id);
        self
    }

    /// Attaches the id of the owning task.
    #[inline]
    pub fn with_parent(mut self, parent: TaskId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_subscriber_overflow(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberOverflow)
    }

    #[inline]
    pub fn is_subscriber_panic(&self) -> bool {
        matches!(self.kind, EventKind::SubscriberPanicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::TaskStarting);
        let b = Event::new(EventKind::TaskCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn overflow_event_names_the_subscriber() {
        let ev = Event::subscriber_overflow("metrics", "full");
        assert!(ev.is_subscriber_overflow());
        assert!(!ev.is_subscriber_panic());
        assert_eq!(ev.task.as_deref(), Some("metrics"));
        assert_eq!(ev.reason.as_deref(), Some("subscriber=metrics reason=full"));
    }
}

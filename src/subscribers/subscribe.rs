//! # Subscriber trait
//!
//! A [`Subscribe`] implementation receives the lifecycle events of every task
//! tree whose bus feeds its [`SubscriberSet`](crate::subscribers::SubscriberSet).
//! Events arrive on a dedicated worker, in publication order, through a bounded
//! queue; a slow subscriber loses events (reported as `SubscriberOverflow`) but
//! never slows down a task.
//!
//! ## Example
//! ```rust
//! use tasktree::{Event, EventKind, Subscribe};
//!
//! /// Records why tasks failed.
//! struct FailureAudit;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for FailureAudit {
//!     async fn on_event(&self, ev: &Event) {
//!         let _why = ev.reason.as_deref().unwrap_or("-");
//!         // write audit record...
//!     }
//!
//!     fn interested(&self, kind: EventKind) -> bool {
//!         kind == EventKind::TaskFailed
//!     }
//!
//!     fn name(&self) -> &'static str { "failure-audit" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

/// Consumer of task events.
///
/// Runs on a tokio worker task; keep `on_event` cooperative (async I/O,
/// no long blocking calls).
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event the subscriber is [`interested`](Self::interested) in.
    async fn on_event(&self, event: &Event);

    /// Filters events before they are queued. Rejected kinds never take up
    /// queue space. Accepts everything by default.
    fn interested(&self, _kind: EventKind) -> bool {
        true
    }

    /// Name used in logs and in `SubscriberOverflow` / `SubscriberPanicked` events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue (min 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}

//! # Logging subscriber for debugging and demos.
//!
//! [`LogWriter`] renders task events through `tracing`, one record per event.
//! Install any `tracing` subscriber (e.g. `tracing-subscriber`'s fmt layer) to
//! see them.
//!
//! ## Output format (fmt layer)
//! ```text
//! DEBUG tasktree::subscribers::log: scheduled task="fetch" id=3 executor="tokio"
//!  INFO tasktree::subscribers::log: completed task="fetch" id=3
//!  WARN tasktree::subscribers::log: failed task="parse" id=4 reason="task failed: bad input"
//! DEBUG tasktree::subscribers::log: cancel requested task="fetch" id=3 executor="tokio"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that logs every event with `tracing`.
///
/// Enabled via the `logging` feature.
pub struct LogWriter;

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let id = e.task_id.map(|id| id.as_u64());
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::TaskScheduled => {
                debug!(task, id, executor = reason, "scheduled");
            }
            EventKind::TaskStarting => {
                debug!(task, id, "starting");
            }
            EventKind::TaskCompleted => {
                info!(task, id, "completed");
            }
            EventKind::TaskFailed => {
                warn!(task, id, reason, "failed");
            }
            EventKind::SubTaskCreated => {
                let parent = e.parent.map(|p| p.as_u64());
                debug!(task, id, parent, "sub-task created");
            }
            EventKind::CancelRequested => {
                debug!(task, id, executor = reason, "cancel requested");
            }
            EventKind::ExecutorGone => {
                warn!(task, id, during = reason, "executor gone");
            }
            EventKind::CompletionRejected => {
                warn!(task, id, "completion rejected");
            }
            EventKind::SubscriberOverflow => {
                warn!(subscriber = task, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = task, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn renders_every_kind() {
        let kinds = [
            EventKind::TaskScheduled,
            EventKind::TaskStarting,
            EventKind::TaskCompleted,
            EventKind::TaskFailed,
            EventKind::SubTaskCreated,
            EventKind::CancelRequested,
            EventKind::ExecutorGone,
            EventKind::CompletionRejected,
            EventKind::SubscriberOverflow,
            EventKind::SubscriberPanicked,
        ];
        for kind in kinds {
            LogWriter.on_event(&Event::new(kind).with_task("t")).await;
        }
    }
}

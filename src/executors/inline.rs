use tracing::trace;

use crate::executors::{Executor, TaskHandle};
use crate::tasks::TaskId;

/// Runs every task on the thread that calls `run()`.
///
/// By the time `run()` returns, the work has executed. Cancellation has nothing to
/// stop and is ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl InlineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for InlineExecutor {
    fn execute(&self, task: TaskHandle) {
        task.execute();
    }

    fn cancel(&self, task: TaskId) {
        trace!(id = %task, "inline executor: cancel ignored");
    }

    fn name(&self) -> &'static str {
        "inline"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{Task, TaskContext, TaskError, WorkFn};

    #[test]
    fn work_has_run_when_run_returns() {
        let exec: Arc<dyn Executor> = Arc::new(InlineExecutor::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let task = Task::builder(WorkFn::new(
            "count",
            move |ctx: &TaskContext<()>| -> Result<(), TaskError> {
                seen.fetch_add(1, Ordering::SeqCst);
                ctx.mark_as_done(Ok(()))?;
                Ok(())
            },
        ))
        .executor(&exec)
        .build();

        task.run().expect("run");
        assert!(task.is_done());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

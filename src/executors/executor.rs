//! # Executor contract.

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::trace;

use crate::tasks::TaskId;
use crate::tasks::core::Runnable;

/// # Runs task work on behalf of tasks.
///
/// Executors are shared (`Arc<dyn Executor>`), never owned by tasks: a task only
/// keeps a weak binding and skips its cancel request once the executor is gone.
///
/// ### Contract
/// - `execute` must eventually call [`TaskHandle::execute`] exactly once, on any
///   thread, or drop the handle (the task then stays pending until it is dropped).
/// - `cancel` is best effort: it must not block and must not call back into the
///   task. It may arrive after the work already ran.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use tasktree::{Executor, Task, TaskContext, TaskError, TaskHandle, TaskId, WorkFn};
///
/// struct Threads;
///
/// impl Executor for Threads {
///     fn execute(&self, task: TaskHandle) {
///         std::thread::spawn(move || task.execute());
///     }
///
///     fn cancel(&self, _task: TaskId) {}
/// }
///
/// let exec: Arc<dyn Executor> = Arc::new(Threads);
/// let task = Task::builder(WorkFn::new("seven", |ctx: &TaskContext<u8>| {
///     ctx.mark_as_done(Ok(7))?;
///     Ok::<_, TaskError>(())
/// }))
/// .executor(&exec)
/// .build();
///
/// assert_eq!(task.run().unwrap().get_results(), &Ok(7));
/// ```
pub trait Executor: Send + Sync + 'static {
    /// Schedules the task. May run it before returning.
    fn execute(&self, task: TaskHandle);

    /// Requests cancellation of a previously scheduled task.
    fn cancel(&self, task: TaskId);

    /// Name used in logs and events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Non-owning handle to a task, handed to [`Executor::execute`].
///
/// Holding a handle does not keep the task alive; [`execute`](Self::execute)
/// keeps it alive only while the work runs.
#[derive(Clone)]
pub struct TaskHandle {
    id: TaskId,
    name: Arc<str>,
    task: Weak<dyn Runnable>,
}

impl TaskHandle {
    pub(crate) fn new(id: TaskId, name: Arc<str>, task: Weak<dyn Runnable>) -> Self {
        Self { id, name, task }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs the task's work on the current thread.
    ///
    /// Returns `false` if the task is gone or its work already ran.
    pub fn execute(&self) -> bool {
        match self.task.upgrade() {
            Some(task) => task.execute(),
            None => {
                trace!(task = %self.name, id = %self.id, "task dropped before execution");
                false
            }
        }
    }

    /// Completes the task with [`TaskError::Canceled`](crate::TaskError::Canceled)
    /// without running its work, for executors that give up on a handle.
    ///
    /// Returns `false` if the task is gone, its work already ran or it is
    /// already done. A settled handle can no longer be executed.
    pub fn cancel(&self) -> bool {
        self.task.upgrade().is_some_and(|task| task.cancel())
    }

    /// Whether the owning task still exists.
    pub fn is_alive(&self) -> bool {
        self.task.strong_count() > 0
    }

    /// Whether the task completed. `false` once it is gone.
    pub fn is_done(&self) -> bool {
        self.task.upgrade().is_some_and(|task| task.is_done())
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Task, TaskContext, TaskError, WorkFn};

    fn answer() -> Task<WorkFn<impl Fn(&TaskContext<u32>) -> Result<(), TaskError> + Send + Sync + 'static, u32>> {
        Task::new(WorkFn::new(
            "answer",
            |ctx: &TaskContext<u32>| -> Result<(), TaskError> {
                ctx.mark_as_done(Ok(42))?;
                Ok(())
            },
        ))
    }

    #[test]
    fn handle_executes_once() {
        let task = answer();
        let handle = task.handle();

        assert!(handle.is_alive());
        assert!(!handle.is_done());
        assert!(handle.execute());
        assert!(handle.is_done());
        assert!(!handle.execute());
        assert_eq!(task.get_results(), &Ok(42));
    }

    #[test]
    fn handle_outliving_task_is_inert() {
        let task = answer();
        let handle = task.handle();
        drop(task);

        assert!(!handle.is_alive());
        assert!(!handle.is_done());
        assert!(!handle.execute());
    }

    #[test]
    fn cancelled_handle_settles_task() {
        let task = answer();
        let handle = task.handle();

        assert!(handle.cancel());
        assert_eq!(task.get_results(), &Err(TaskError::Canceled));
        assert!(!handle.execute());
        assert!(!handle.cancel());
        assert!(task.run().is_err());
    }

    #[test]
    fn cancel_after_execute_keeps_outcome() {
        let task = answer();
        let handle = task.handle();

        assert!(handle.execute());
        assert!(!handle.cancel());
        assert_eq!(task.get_results(), &Ok(42));
    }

    #[test]
    fn executed_handle_blocks_later_run() {
        let task = answer();
        assert!(task.handle().execute());
        assert!(task.run().is_err());
    }
}

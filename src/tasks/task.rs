//! # Task: the owning handle of one unit of work.
//!
//! [`Task`] runs a [`Work`] once, inline or through an [`Executor`], completes
//! exactly once and owns every sub-task its work creates.
//!
//! ## Lifecycle
//! ```text
//! Task::new / Task::builder(..).build()
//!   │
//!   ├─► set_executor(&exec)            (optional, may be rebound)
//!   │
//!   ├─► run()
//!   │     ├─ executor bound & alive ─► exec.execute(handle) ─► (executor thread) work.execute(ctx)
//!   │     ├─ executor gone          ─► Err(ExecutorGone)  | inline (ExecutorGonePolicy::RunInline)
//!   │     └─ unbound / run_sync()   ─► work.execute(ctx) on the calling thread
//!   │
//!   ├─► work: ctx.create_task(..) … ctx.mark_as_done(outcome)
//!   │                                   ├─► signal fires (wait() returns)
//!   │                                   └─► callback(&dyn AnyTask)
//!   │
//!   ├─► wait() / get_results()
//!   │
//!   └─► drop
//!         ├─ executor bound & alive ─► exec.cancel(id)
//!         └─ sub-tasks dropped (reverse creation order), each repeating this step
//! ```
//!
//! ## Rules
//! - `run` succeeds at most once; later calls return [`StateError::AlreadyStarted`].
//! - `wait` may be called from any number of threads, before or after `run`.
//! - Returning from `run` does not mean the task is complete; only `wait` says so.
//! - Do not drop a task whose work is still running on an executor thread unless the
//!   executor's `cancel` stops it; the shared state stays valid, but the work keeps
//!   going without an owner.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::config::Config;
use crate::error::StateError;
use crate::events::Bus;
use crate::executors::{Executor, TaskHandle};
use crate::tasks::callback::{Completed, TaskCallback, create_task_callback};
use crate::tasks::core::{Inherited, Inner, OwnedTask};
use crate::tasks::{Outcome, SubTask, TaskId, Work};

/// Owning handle of a task. Not `Clone`: exactly one owner per task.
pub struct Task<W: Work> {
    inner: Arc<Inner<W>>,
}

impl<W: Work> Task<W> {
    /// Creates a task without a completion callback.
    pub fn new(work: W) -> Self {
        Self::builder(work).build()
    }

    /// Creates a task that calls `callback` once it completes.
    ///
    /// The callback is stored, not invoked.
    pub fn with_callback(work: W, callback: TaskCallback) -> Self {
        Self::builder(work).callback(callback).build()
    }

    /// Starts building a task with optional executor, bus and config.
    pub fn builder(work: W) -> TaskBuilder<W> {
        TaskBuilder::new(work)
    }

    pub(crate) fn from_parts(
        work: W,
        callback: Option<TaskCallback>,
        name: Option<Arc<str>>,
        inherited: Inherited,
    ) -> Self {
        Self {
            inner: Inner::new(work, callback, name, inherited),
        }
    }

    pub(crate) fn downgrade(&self) -> SubTask<W> {
        SubTask::new(
            self.inner.node.id,
            Arc::clone(&self.inner.node.name),
            Arc::downgrade(&self.inner),
        )
    }

    pub fn id(&self) -> TaskId {
        self.inner.node.id
    }

    pub fn name(&self) -> &str {
        &self.inner.node.name
    }

    /// The work this task runs.
    pub fn work(&self) -> &W {
        &self.inner.work
    }

    /// Binds (or rebinds) the executor. Existing sub-tasks keep their binding.
    pub fn set_executor(&self, executor: &Arc<dyn Executor>) {
        self.inner.node.set_executor(Arc::downgrade(executor));
    }

    /// Removes the executor binding; later runs execute inline.
    pub fn clear_executor(&self) {
        self.inner.node.clear_executor();
    }

    /// Runs the task on its executor, or inline when none is bound.
    ///
    /// ### Errors
    /// - [`StateError::AlreadyStarted`] on a second run
    /// - [`StateError::ExecutorGone`] if the bound executor was dropped and the
    ///   config says [`ExecutorGonePolicy::Reject`](crate::ExecutorGonePolicy::Reject)
    pub fn run(&self) -> Result<&Self, StateError> {
        self.inner.run(false)?;
        Ok(self)
    }

    /// Runs the task inline on the calling thread, ignoring any bound executor.
    pub fn run_sync(&self) -> Result<&Self, StateError> {
        self.inner.run(true)?;
        Ok(self)
    }

    /// Blocks the calling thread until the task completes.
    ///
    /// Inside an async context prefer [`wait_async`](Self::wait_async).
    pub fn wait(&self) -> &Self {
        self.inner.wait();
        self
    }

    /// Waits asynchronously until the task completes.
    pub async fn wait_async(&self) -> &Self {
        self.inner.wait_async().await;
        self
    }

    /// Waits, then returns the outcome.
    pub fn get_results(&self) -> &Outcome<W::Output> {
        self.inner.wait()
    }

    /// Returns the outcome without waiting.
    ///
    /// ### Errors
    /// [`StateError::Pending`] if the task has not completed yet.
    pub fn try_results(&self) -> Result<&Outcome<W::Output>, StateError> {
        self.inner.outcome().ok_or_else(|| StateError::Pending {
            task: self.name().to_string(),
        })
    }

    pub fn is_done(&self) -> bool {
        self.inner.outcome().is_some()
    }

    /// Ids of the owned sub-tasks, in creation order.
    pub fn sub_task_ids(&self) -> Vec<TaskId> {
        self.inner.node.child_ids()
    }

    /// Non-owning handle of the kind executors receive.
    pub fn handle(&self) -> TaskHandle {
        self.inner.handle()
    }
}

impl<W: Work> Drop for Task<W> {
    fn drop(&mut self) {
        self.inner.node.teardown();
    }
}

impl<W: Work> OwnedTask for Task<W> {
    fn id(&self) -> TaskId {
        self.inner.node.id
    }
}

impl<W: Work> fmt::Debug for Task<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("done", &self.is_done())
            .finish()
    }
}

/// Builder for a root [`Task`].
///
/// Whatever is set here (executor, bus, config) is inherited by the sub-tasks the
/// work creates.
pub struct TaskBuilder<W: Work> {
    work: W,
    name: Option<Arc<str>>,
    callback: Option<TaskCallback>,
    inherited: Inherited,
}

impl<W: Work> TaskBuilder<W> {
    fn new(work: W) -> Self {
        Self {
            work,
            name: None,
            callback: None,
            inherited: Inherited::default(),
        }
    }

    /// Overrides the name reported by [`Work::name`].
    pub fn name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the generic completion callback.
    pub fn callback(mut self, callback: TaskCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// Sets a completion callback written against the concrete work type.
    pub fn on_complete<F>(self, f: F) -> Self
    where
        F: FnOnce(Completed<'_, W>) + Send + 'static,
    {
        self.callback(create_task_callback::<W, F>(f))
    }

    /// Binds the executor.
    pub fn executor(mut self, executor: &Arc<dyn Executor>) -> Self {
        let weak: Weak<dyn Executor> = Arc::downgrade(executor);
        self.inherited.executor = Some(weak);
        self
    }

    /// Attaches an event bus; lifecycle events of the whole tree go there.
    pub fn bus(mut self, bus: Bus) -> Self {
        self.inherited.bus = Some(bus);
        self
    }

    /// Applies the policies of `cfg`.
    pub fn config(mut self, cfg: &Config) -> Self {
        self.inherited.policy = cfg.on_executor_gone;
        self
    }

    pub fn build(self) -> Task<W> {
        Task::from_parts(self.work, self.callback, self.name, self.inherited)
    }
}

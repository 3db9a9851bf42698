//! # Tokio-backed executor.
//!
//! [`TokioExecutor`] hands each task to the blocking pool of a tokio runtime
//! (`spawn_blocking`), since task work is synchronous and may block on `wait()`.
//!
//! ## Cancellation
//! ```text
//! execute(handle) ──► pending[id] = token ──► spawn_blocking(Scheduled)
//!                                               ├─ token cancelled → handle.cancel()  (Err(Canceled))
//!                                               ├─ otherwise       → handle.execute()
//!                                               └─ never run (runtime gone) → handle.cancel()
//! cancel(id) ──► pending.remove(id)?.cancel()
//! shutdown() ──► root token cancelled (every pending task settles as canceled)
//! ```
//! Every path removes `pending[id]`. A task whose work already started is not
//! interrupted.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::RuntimeError;
use crate::executors::{Executor, TaskHandle};
use crate::tasks::TaskId;

/// Runs tasks on the blocking thread pool of a tokio runtime.
#[derive(Debug)]
pub struct TokioExecutor {
    runtime: Handle,
    root: CancellationToken,
    pending: Arc<Mutex<HashMap<TaskId, CancellationToken>>>,
}

impl TokioExecutor {
    /// Creates an executor that spawns onto `runtime`.
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            root: CancellationToken::new(),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Creates an executor for the runtime the caller is running in.
    ///
    /// ### Errors
    /// [`RuntimeError::NoRuntime`] when called outside a tokio runtime.
    pub fn try_current() -> Result<Self, RuntimeError> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| RuntimeError::NoRuntime {
                reason: e.to_string(),
            })
    }

    /// Number of tasks handed over but not yet started.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Settles every task that has not started yet as canceled, including ones
    /// scheduled later.
    pub fn shutdown(&self) {
        debug!(pending = self.pending(), "tokio executor shutting down");
        self.root.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.root.is_cancelled()
    }
}

/// A handed-over task on its way to the blocking pool.
///
/// Dropped without [`start`](Self::start), it removes its pending entry and
/// settles the task as canceled. This also covers a closure the runtime drops
/// without running it.
struct Scheduled {
    id: TaskId,
    task: Option<TaskHandle>,
    pending: Arc<Mutex<HashMap<TaskId, CancellationToken>>>,
}

impl Scheduled {
    fn start(mut self) -> Option<TaskHandle> {
        self.task.take()
    }
}

impl Drop for Scheduled {
    fn drop(&mut self) {
        self.pending.lock().remove(&self.id);
        if let Some(task) = self.task.take() {
            if task.cancel() {
                trace!(task = task.name(), id = %self.id, "skipped; settled as canceled");
            }
        }
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, task: TaskHandle) {
        let id = task.id();
        let token = self.root.child_token();
        self.pending.lock().insert(id, token.clone());

        let scheduled = Scheduled {
            id,
            task: Some(task),
            pending: Arc::clone(&self.pending),
        };
        self.runtime.spawn_blocking(move || {
            if token.is_cancelled() {
                return;
            }
            if let Some(task) = scheduled.start() {
                task.execute();
            }
        });
    }

    fn cancel(&self, task: TaskId) {
        let token = self.pending.lock().remove(&task);
        match token {
            Some(token) => {
                trace!(id = %task, "cancelling pending task");
                token.cancel();
            }
            None => trace!(id = %task, "cancel: task not pending"),
        }
    }

    fn name(&self) -> &'static str {
        "tokio"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::{Task, TaskContext, TaskError, WorkFn};

    fn constant(
        name: &'static str,
        value: u32,
    ) -> Task<WorkFn<impl Fn(&TaskContext<u32>) -> Result<(), TaskError> + Send + Sync + 'static, u32>>
    {
        Task::new(WorkFn::new(
            name,
            move |ctx: &TaskContext<u32>| -> Result<(), TaskError> {
                ctx.mark_as_done(Ok(value))?;
                Ok(())
            },
        ))
    }

    fn single_thread_pool() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(1)
            .build()
            .expect("runtime")
    }

    #[test]
    fn try_current_outside_runtime_fails() {
        let err = TokioExecutor::try_current().expect_err("no runtime here");
        assert_eq!(err.as_label(), "runtime_missing");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn runs_on_blocking_pool() {
        let exec: Arc<dyn Executor> = Arc::new(TokioExecutor::try_current().expect("runtime"));
        let caller = std::thread::current().id();

        let task = Task::builder(WorkFn::new(
            "where",
            move |ctx: &TaskContext<bool>| -> Result<(), TaskError> {
                ctx.mark_as_done(Ok(std::thread::current().id() != caller))?;
                Ok(())
            },
        ))
        .executor(&exec)
        .build();

        task.run().expect("run");
        assert_eq!(task.wait_async().await.get_results(), &Ok(true));
    }

    #[test]
    fn cancel_skips_pending_task() {
        let rt = single_thread_pool();
        let tokio_exec = Arc::new(TokioExecutor::new(rt.handle().clone()));
        let exec: Arc<dyn Executor> = tokio_exec.clone();

        // Occupy the only blocking thread.
        let (release, gate) = mpsc::channel::<()>();
        rt.spawn_blocking(move || gate.recv());

        let skipped = constant("skipped", 1);
        skipped.set_executor(&exec);
        skipped.run().expect("run");
        assert_eq!(tokio_exec.pending(), 1);

        exec.cancel(skipped.id());
        assert_eq!(tokio_exec.pending(), 0);

        let follow_up = constant("follow_up", 2);
        follow_up.set_executor(&exec);
        follow_up.run().expect("run");

        release.send(()).expect("release");
        assert_eq!(follow_up.get_results(), &Ok(2));
        assert_eq!(skipped.get_results(), &Err(TaskError::Canceled));
    }

    #[test]
    fn shutdown_skips_later_tasks() {
        let rt = single_thread_pool();
        let tokio_exec = Arc::new(TokioExecutor::new(rt.handle().clone()));
        let exec: Arc<dyn Executor> = tokio_exec.clone();
        tokio_exec.shutdown();
        assert!(tokio_exec.is_shutdown());

        let task = constant("late", 3);
        task.set_executor(&exec);
        task.run().expect("run");

        assert_eq!(task.get_results(), &Err(TaskError::Canceled));
        assert_eq!(tokio_exec.pending(), 0);
    }

    #[test]
    fn stopped_runtime_settles_task_and_forgets_it() {
        let rt = single_thread_pool();
        let tokio_exec = Arc::new(TokioExecutor::new(rt.handle().clone()));
        let exec: Arc<dyn Executor> = tokio_exec.clone();
        drop(rt);

        let task = constant("orphan", 4);
        task.set_executor(&exec);
        task.run().expect("run");

        assert_eq!(tokio_exec.pending(), 0);
        assert_eq!(task.get_results(), &Err(TaskError::Canceled));
    }
}

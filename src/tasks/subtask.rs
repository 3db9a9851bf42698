//! # Non-owning handle to a sub-task.
//!
//! Returned by [`TaskContext::create_task`](crate::TaskContext::create_task). The
//! parent owns the child; this handle only reaches it while the parent is alive.
//! Every operation returns [`StateError::Detached`] afterwards.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::StateError;
use crate::executors::{Executor, TaskHandle};
use crate::tasks::core::Inner;
use crate::tasks::{Outcome, TaskId, Work};

/// Handle to a task owned by another task.
pub struct SubTask<W: Work> {
    id: TaskId,
    name: Arc<str>,
    inner: Weak<Inner<W>>,
}

impl<W: Work> Clone for SubTask<W> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<W: Work> SubTask<W> {
    pub(crate) fn new(id: TaskId, name: Arc<str>, inner: Weak<Inner<W>>) -> Self {
        Self { id, name, inner }
    }

    fn upgrade(&self) -> Result<Arc<Inner<W>>, StateError> {
        self.inner.upgrade().ok_or_else(|| StateError::Detached {
            task: self.name.to_string(),
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the owning parent is still alive.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Whether the sub-task has completed. `false` once it is gone.
    pub fn is_done(&self) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|inner| inner.outcome().is_some())
    }

    /// Rebinds the executor of this sub-task only.
    pub fn set_executor(&self, executor: &Arc<dyn Executor>) -> Result<(), StateError> {
        self.upgrade()?.node.set_executor(Arc::downgrade(executor));
        Ok(())
    }

    /// Same as [`Task::run`](crate::Task::run).
    pub fn run(&self) -> Result<&Self, StateError> {
        self.upgrade()?.run(false)?;
        Ok(self)
    }

    /// Same as [`Task::run_sync`](crate::Task::run_sync).
    pub fn run_sync(&self) -> Result<&Self, StateError> {
        self.upgrade()?.run(true)?;
        Ok(self)
    }

    /// Blocks until the sub-task completes.
    pub fn wait(&self) -> Result<&Self, StateError> {
        self.upgrade()?.wait();
        Ok(self)
    }

    /// Waits asynchronously until the sub-task completes.
    pub async fn wait_async(&self) -> Result<&Self, StateError> {
        let inner = self.upgrade()?;
        inner.wait_async().await;
        Ok(self)
    }

    /// Waits, then hands the outcome to `f`.
    pub fn with_results<R>(&self, f: impl FnOnce(&Outcome<W::Output>) -> R) -> Result<R, StateError> {
        let inner = self.upgrade()?;
        Ok(f(inner.wait()))
    }

    /// Waits, then returns a copy of the outcome.
    pub fn get_results(&self) -> Result<Outcome<W::Output>, StateError>
    where
        W::Output: Clone,
    {
        self.with_results(|outcome| outcome.clone())
    }

    /// Non-owning handle of the kind executors receive.
    pub fn handle(&self) -> Result<TaskHandle, StateError> {
        Ok(self.upgrade()?.handle())
    }
}

impl<W: Work> fmt::Debug for SubTask<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubTask")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

//! # What work sees while it executes.
//!
//! [`TaskContext`] is handed to [`Work::execute`] and carries the operations only
//! the running task may perform:
//! - complete itself ([`TaskContext::mark_as_done`], [`TaskContext::completion`]);
//! - create sub-tasks it owns ([`TaskContext::create_task`]).
//!
//! [`Completion`] is the detachable form of `mark_as_done`: clone it into a
//! sub-task callback or another thread and complete from there.

use std::sync::{Arc, Weak};

use crate::error::StateError;
use crate::tasks::callback::TaskCallback;
use crate::tasks::core::Complete;
use crate::tasks::{Outcome, SubTask, TaskId, Work};

/// Execution context of a running task producing `T`.
pub struct TaskContext<T> {
    task: Arc<dyn Complete<T>>,
}

impl<T: Send + Sync + 'static> TaskContext<T> {
    pub(crate) fn new(task: Arc<dyn Complete<T>>) -> Self {
        Self { task }
    }

    pub fn id(&self) -> TaskId {
        self.task.node().id
    }

    pub fn name(&self) -> &str {
        &self.task.node().name
    }

    /// Completes the task: fires the completion signal, then runs the callback.
    ///
    /// ### Errors
    /// [`StateError::AlreadyCompleted`] if the task was completed before; the first
    /// outcome is kept and the callback is not called again.
    pub fn mark_as_done(&self, outcome: Outcome<T>) -> Result<(), StateError> {
        self.task.complete(outcome)
    }

    /// Returns a handle that can complete this task later, from any thread.
    pub fn completion(&self) -> Completion<T> {
        Completion {
            id: self.id(),
            name: Arc::clone(&self.task.node().name),
            task: Arc::downgrade(&self.task),
        }
    }

    /// Whether the task has already been completed.
    pub fn is_done(&self) -> bool {
        self.task.is_done()
    }

    /// Creates a sub-task owned by this task.
    ///
    /// The child is bound to this task's current executor (and event bus and
    /// config) before it is returned. It lives exactly as long as this task.
    pub fn create_task<C: Work>(&self, work: C) -> SubTask<C> {
        self.task.node().adopt(work, None)
    }

    /// Like [`create_task`](Self::create_task), with a completion callback for the child.
    pub fn create_task_with<C: Work>(&self, work: C, callback: TaskCallback) -> SubTask<C> {
        self.task.node().adopt(work, Some(callback))
    }

    /// Number of sub-tasks created so far.
    pub fn sub_task_count(&self) -> usize {
        self.task.node().child_count()
    }
}

/// Detachable completion handle of a task producing `T`.
///
/// Holds only a weak reference: once the task is dropped, completing returns
/// [`StateError::Detached`].
pub struct Completion<T> {
    id: TaskId,
    name: Arc<str>,
    task: Weak<dyn Complete<T>>,
}

impl<T> Clone for Completion<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            task: Weak::clone(&self.task),
        }
    }
}

impl<T: Send + Sync + 'static> Completion<T> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Same contract as [`TaskContext::mark_as_done`].
    pub fn mark_as_done(&self, outcome: Outcome<T>) -> Result<(), StateError> {
        match self.task.upgrade() {
            Some(task) => task.complete(outcome),
            None => Err(StateError::Detached {
                task: self.name.to_string(),
            }),
        }
    }

    /// Whether the task was completed. `false` once the task is gone.
    pub fn is_done(&self) -> bool {
        self.task.upgrade().is_some_and(|task| task.is_done())
    }
}

impl<T> std::fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completion")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

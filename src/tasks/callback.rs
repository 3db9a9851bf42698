//! # Completion callbacks.
//!
//! A task stores at most one [`TaskCallback`] and invokes it exactly once, right
//! after its completion signal fired. The callback receives the finished task as a
//! type-erased [`AnyTask`]; [`create_task_callback`] turns a callback written
//! against the concrete work type into that generic form, checking the type
//! instead of assuming it.
//!
//! ```text
//! mark_as_done(outcome)
//!   ├─► signal fires (waiters wake)
//!   └─► callback(&dyn AnyTask)
//!         └─► create_task_callback::<W> ──downcast──► f(Completed<'_, W>)
//!                                         └─ mismatch → logged, f not called
//! ```

use std::any::Any;

use tracing::error;

use crate::error::{StateError, TaskError};
use crate::tasks::core::Inner;
use crate::tasks::{Outcome, TaskId, Work};

/// Generic completion callback, called once with the finished task.
pub type TaskCallback = Box<dyn FnOnce(&dyn AnyTask) + Send + 'static>;

/// Type-erased view of a task.
pub trait AnyTask: Send + Sync + 'static {
    /// Task identity.
    fn id(&self) -> TaskId;

    /// Task name.
    fn name(&self) -> &str;

    /// Whether the completion signal has fired.
    fn is_done(&self) -> bool;

    /// Name of the concrete work type.
    fn type_name(&self) -> &'static str;

    /// Upcast used for checked downcasts.
    fn as_any(&self) -> &dyn Any;
}

impl dyn AnyTask {
    /// Recovers the concrete view of a finished task.
    ///
    /// ### Errors
    /// - [`StateError::TypeMismatch`] if the task does not run `W`
    /// - [`StateError::Pending`] if the task has not completed yet
    pub fn completed<W: Work>(&self) -> Result<Completed<'_, W>, StateError> {
        let inner = self
            .as_any()
            .downcast_ref::<Inner<W>>()
            .ok_or_else(|| StateError::TypeMismatch {
                expected: std::any::type_name::<W>(),
                actual: self.type_name(),
            })?;

        Completed::from_inner(inner).ok_or_else(|| StateError::Pending {
            task: self.name().to_string(),
        })
    }

    /// Checked counterpart of reading results through a raw downcast.
    pub fn results<W: Work>(&self) -> Result<&Outcome<W::Output>, StateError> {
        Ok(self.completed::<W>()?.outcome)
    }
}

/// A finished task seen through its concrete work type.
pub struct Completed<'a, W: Work> {
    id: TaskId,
    name: &'a str,
    work: &'a W,
    outcome: &'a Outcome<W::Output>,
}

impl<'a, W: Work> Completed<'a, W> {
    pub(crate) fn from_inner(inner: &'a Inner<W>) -> Option<Self> {
        Some(Self {
            id: inner.node.id,
            name: &inner.node.name,
            work: &inner.work,
            outcome: inner.outcome()?,
        })
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The work the task ran.
    pub fn work(&self) -> &'a W {
        self.work
    }

    /// The success/failure union the task completed with.
    pub fn outcome(&self) -> &'a Outcome<W::Output> {
        self.outcome
    }

    /// The output, if the task succeeded.
    pub fn output(&self) -> Option<&'a W::Output> {
        self.outcome.as_ref().ok()
    }

    /// The error, if the task failed.
    pub fn error(&self) -> Option<&'a TaskError> {
        self.outcome.as_ref().err()
    }
}

/// Adapts a callback written for work type `W` into a [`TaskCallback`].
///
/// If the task turns out not to run `W`, the mismatch is logged and `callback`
/// is dropped without being called.
///
/// ## Example
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use tasktree::{create_task_callback, Task, TaskContext, TaskError, Work};
///
/// struct Double(u32);
///
/// impl Work for Double {
///     type Output = u32;
///
///     fn execute(&self, ctx: &TaskContext<u32>) -> Result<(), TaskError> {
///         ctx.mark_as_done(Ok(self.0 * 2))?;
///         Ok(())
///     }
/// }
///
/// let seen = Arc::new(Mutex::new(None));
/// let sink = Arc::clone(&seen);
/// let task = Task::with_callback(
///     Double(21),
///     create_task_callback::<Double, _>(move |done| {
///         *sink.lock().unwrap() = done.output().copied();
///     }),
/// );
///
/// task.run().unwrap().wait();
/// assert_eq!(*seen.lock().unwrap(), Some(42));
/// ```
pub fn create_task_callback<W, F>(callback: F) -> TaskCallback
where
    W: Work,
    F: FnOnce(Completed<'_, W>) + Send + 'static,
{
    Box::new(move |task: &dyn AnyTask| match task.completed::<W>() {
        Ok(done) => callback(done),
        Err(e) => {
            error!(task = task.name(), id = %task.id(), error = %e, "typed completion callback skipped");
        }
    })
}

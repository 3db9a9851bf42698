//! # Work abstraction and function-backed implementation.
//!
//! This module defines the [`Work`] trait, the body a [`Task`](crate::Task) runs, and
//! a convenient closure-backed implementation [`WorkFn`].
//!
//! Work receives a [`TaskContext`] and is responsible for completing its task exactly
//! once, either before returning from [`Work::execute`] or later from another thread
//! through a [`Completion`](crate::Completion) handle.
//!
//! ## Example
//! ```rust
//! use tasktree::{Task, TaskContext, TaskError, Work};
//!
//! struct Square(u64);
//!
//! impl Work for Square {
//!     type Output = u64;
//!
//!     fn name(&self) -> &str { "square" }
//!
//!     fn execute(&self, ctx: &TaskContext<u64>) -> Result<(), TaskError> {
//!         ctx.mark_as_done(Ok(self.0 * self.0))?;
//!         Ok(())
//!     }
//! }
//!
//! let task = Task::new(Square(7));
//! task.run().unwrap();
//! assert_eq!(task.get_results(), &Ok(49));
//! ```

use std::borrow::Cow;
use std::marker::PhantomData;

use crate::error::TaskError;
use crate::tasks::context::TaskContext;

/// # A unit of deferred work.
///
/// `execute` may:
/// - complete immediately with [`TaskContext::mark_as_done`];
/// - spawn sub-tasks with [`TaskContext::create_task`] and complete once they finish;
/// - return `Err(e)`, in which case the task completes with `Err(e)` unless it was
///   already completed.
///
/// Returning `Ok(())` without completing leaves the task pending; some other path must
/// complete it or every waiter blocks forever.
pub trait Work: Send + Sync + 'static {
    /// Value produced on success.
    type Output: Send + Sync + 'static;

    /// Returns a stable, human-readable name used in logs, events and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Performs the work.
    fn execute(&self, ctx: &TaskContext<Self::Output>) -> Result<(), TaskError>;
}

/// Function-backed work.
///
/// Wraps a closure `F: Fn(&TaskContext<T>) -> Result<(), TaskError>`.
pub struct WorkFn<F, T> {
    name: Cow<'static, str>,
    f: F,
    _output: PhantomData<fn() -> T>,
}

impl<F, T> WorkFn<F, T> {
    /// Creates new function-backed work.
    ///
    /// ## Example
    /// ```rust
    /// use tasktree::{Task, TaskContext, TaskError, WorkFn};
    ///
    /// let task = Task::new(WorkFn::new("answer", |ctx: &TaskContext<u32>| {
    ///     ctx.mark_as_done(Ok(42))?;
    ///     Ok::<_, TaskError>(())
    /// }));
    /// assert_eq!(task.name(), "answer");
    /// ```
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _output: PhantomData,
        }
    }
}

impl<F, T> Work for WorkFn<F, T>
where
    F: Fn(&TaskContext<T>) -> Result<(), TaskError> + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, ctx: &TaskContext<T>) -> Result<(), TaskError> {
        (self.f)(ctx)
    }
}

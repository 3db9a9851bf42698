//! # Executors: where task work runs.
//!
//! A task never decides on which thread its work runs. When an [`Executor`] is
//! bound, [`Task::run`](crate::Task::run) hands it a [`TaskHandle`] and returns;
//! the executor calls [`TaskHandle::execute`] whenever and wherever it likes.
//! When a bound task is dropped, the executor receives [`Executor::cancel`] with
//! the task id.
//!
//! ## Contents
//! - [`Executor`] the contract
//! - [`TaskHandle`] what executors receive
//! - [`InlineExecutor`] runs on the caller's thread
//! - [`TokioExecutor`] runs on the blocking pool of a tokio runtime
//!
//! ```text
//! task.run() ──► exec.execute(handle) ──► (exec thread) handle.execute()
//! drop(task) ──► exec.cancel(id)
//! ```

mod executor;
mod inline;
mod runtime;

pub use executor::{Executor, TaskHandle};
pub use inline::InlineExecutor;
pub use runtime::TokioExecutor;

//! # Tasks: work, ownership and completion.
//!
//! This module provides the core task-related types:
//! - [`Work`] - trait for implementing a unit of work
//! - [`WorkFn`] - function-based work implementation
//! - [`Task`] - owning handle that runs work once and owns its sub-tasks
//! - [`SubTask`] - non-owning handle to a task owned by a parent
//! - [`TaskContext`] / [`Completion`] - what running work uses to complete and spawn
//! - [`TaskCallback`] / [`create_task_callback`] - completion notification
//!
//! ## Ownership
//! ```text
//! Task (root) ──owns──► SubTask A ──owns──► SubTask A1
//!             └─owns──► SubTask B
//! ```
//! Dropping a task requests cancellation from its executor and drops everything it
//! owns, newest first.

mod callback;
mod context;
pub(crate) mod core;
mod id;
mod signal;
mod subtask;
mod task;
mod work;

use crate::error::TaskError;

pub use callback::{AnyTask, Completed, TaskCallback, create_task_callback};
pub use context::{Completion, TaskContext};
pub use id::TaskId;
pub use subtask::SubTask;
pub use task::{Task, TaskBuilder};
pub use work::{Work, WorkFn};

/// Success/failure union a task completes with.
pub type Outcome<T> = Result<T, TaskError>;

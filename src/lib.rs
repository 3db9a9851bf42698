//! # tasktree
//!
//! **tasktree** is a small library of deferred tasks for Rust.
//!
//! A [`Task`] wraps one unit of [`Work`], runs it exactly once (inline, or on a
//! pluggable [`Executor`]), completes exactly once through a one-shot signal, and
//! owns every sub-task its work creates. Dropping a task asks its executor to
//! cancel it and drops its sub-tasks with it.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!          ┌────────────────────────┐            ┌──────────────────────┐
//!          │  Task<W> (owner)       │  execute   │  Executor            │
//!          │  - Work W              ├───────────►│  (Inline, Tokio, …)  │
//!          │  - one-shot Signal     │  cancel    │                      │
//!          │  - callback            ├───────────►│  runs TaskHandle     │
//!          │  - owned sub-tasks     │            └──────────┬───────────┘
//!          └───────┬────────────────┘                       │
//!                  │ owns                                    │ handle.execute()
//!        ┌─────────┴─────────┐                               ▼
//!        ▼                   ▼                     Work::execute(&TaskContext)
//!   ┌──────────┐        ┌──────────┐                 ├─ ctx.create_task(..)
//!   │ sub-task │        │ sub-task │                 └─ ctx.mark_as_done(outcome)
//!   └──────────┘        └──────────┘                       ├─► waiters wake
//!                                                          └─► callback fires
//!
//!   Bus (optional) ──► SubscriberSet ──► Subscribe::on_event (logging, metrics, …)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Task::builder(work).executor(&exec).build()
//!   ├─► run()      ─► exec.execute(handle)   (or inline when unbound / run_sync)
//!   ├─► wait()     ─► blocks until mark_as_done
//!   ├─► get_results() ─► &Result<Output, TaskError>
//!   └─► drop       ─► exec.cancel(id), then sub-tasks newest first
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                              |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------------|
//! | **Tasks**         | Define work, run it, wait for it, own sub-tasks.              | [`Work`], [`WorkFn`], [`Task`], [`SubTask`]      |
//! | **Completion**    | Complete from any thread, get notified once.                  | [`TaskContext`], [`Completion`], [`TaskCallback`] |
//! | **Executors**     | Decide where work runs; receive cancel requests.              | [`Executor`], [`InlineExecutor`], [`TokioExecutor`] |
//! | **Errors**        | Typed outcomes and checked contract violations.               | [`TaskError`], [`StateError`], [`RuntimeError`] |
//! | **Subscriber API**| Hook into task lifecycle events.                              | [`Subscribe`], [`SubscriberSet`], [`Bus`]        |
//! | **Configuration** | Event bus sizing and expired-executor policy.                 | [`Config`], [`ExecutorGonePolicy`]               |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] subscriber that logs through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tasktree::{Executor, InlineExecutor, Task, TaskContext, TaskError, Work};
//!
//! /// Counts up to n by splitting it in halves, one sub-task per half.
//! struct Count(u64);
//!
//! impl Work for Count {
//!     type Output = u64;
//!
//!     fn execute(&self, ctx: &TaskContext<u64>) -> Result<(), TaskError> {
//!         if self.0 <= 1 {
//!             ctx.mark_as_done(Ok(self.0))?;
//!             return Ok(());
//!         }
//!         let half = self.0 / 2;
//!         let low = ctx.create_task(Count(half));
//!         let high = ctx.create_task(Count(self.0 - half));
//!         low.run()?;
//!         high.run()?;
//!         let low = low.get_results()??;
//!         let high = high.get_results()??;
//!         ctx.mark_as_done(Ok(low + high))?;
//!         Ok(())
//!     }
//! }
//!
//! let exec: Arc<dyn Executor> = Arc::new(InlineExecutor::new());
//! let task = Task::builder(Count(8)).executor(&exec).build();
//!
//! assert_eq!(task.run().unwrap().get_results(), &Ok(8));
//! assert_eq!(task.sub_task_ids().len(), 2);
//! ```

mod config;
mod error;
mod events;
mod executors;
mod subscribers;
mod tasks;

#[cfg(test)]
mod test_utils;

// ---- Public re-exports ----

pub use config::{Config, ExecutorGonePolicy};
pub use error::{RuntimeError, StateError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use executors::{Executor, InlineExecutor, TaskHandle, TokioExecutor};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{
    AnyTask, Completed, Completion, Outcome, SubTask, Task, TaskBuilder, TaskCallback, TaskContext,
    TaskId, Work, WorkFn, create_task_callback,
};

// Optional: expose a built-in logging subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

//! Error types used by tasks, their executors and the surrounding runtime.
//!
//! This module defines three enums:
//!
//! - [`StateError`] - a caller broke the task lifecycle contract (run twice,
//!   completed twice, asked for the wrong result type, ...).
//! - [`TaskError`] - the failure half of a task [`Outcome`](crate::Outcome).
//! - [`RuntimeError`] - wiring problems around an executor.
//!
//! All types provide `as_label` / `as_message` helpers for logs and metrics.

use std::any::Any;

use thiserror::Error;

/// # Lifecycle contract violations.
///
/// These used to be undefined behavior for a task primitive. Here they are
/// detected and returned to the caller.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// `run` was called on a task that has already been started.
    #[error("task {task:?} was already started")]
    AlreadyStarted {
        /// Name of the offending task.
        task: String,
    },

    /// The task was marked as done more than once.
    #[error("task {task:?} was already completed")]
    AlreadyCompleted {
        /// Name of the offending task.
        task: String,
    },

    /// The bound executor has been dropped.
    #[error("executor bound to task {task:?} is gone")]
    ExecutorGone {
        /// Name of the task whose executor expired.
        task: String,
    },

    /// Results were requested with a work type that does not match the task.
    #[error("type mismatch: expected {expected}, task holds {actual}")]
    TypeMismatch {
        /// Type the caller asked for.
        expected: &'static str,
        /// Type the task actually runs.
        actual: &'static str,
    },

    /// Results were requested without waiting and the task is not done yet.
    #[error("task {task:?} has not completed yet")]
    Pending {
        /// Name of the pending task.
        task: String,
    },

    /// The handle outlived the task it points to.
    #[error("task {task:?} no longer exists")]
    Detached {
        /// Name of the task at the time the handle was created.
        task: String,
    },
}

impl StateError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasktree::StateError;
    ///
    /// let err = StateError::AlreadyCompleted { task: "fetch".into() };
    /// assert_eq!(err.as_label(), "state_already_completed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StateError::AlreadyStarted { .. } => "state_already_started",
            StateError::AlreadyCompleted { .. } => "state_already_completed",
            StateError::ExecutorGone { .. } => "state_executor_gone",
            StateError::TypeMismatch { .. } => "state_type_mismatch",
            StateError::Pending { .. } => "state_pending",
            StateError::Detached { .. } => "state_detached",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StateError::AlreadyStarted { task } => format!("already started: {task}"),
            StateError::AlreadyCompleted { task } => format!("already completed: {task}"),
            StateError::ExecutorGone { task } => format!("executor gone: {task}"),
            StateError::TypeMismatch { expected, actual } => {
                format!("expected={expected} actual={actual}")
            }
            StateError::Pending { task } => format!("pending: {task}"),
            StateError::Detached { task } => format!("detached: {task}"),
        }
    }
}

/// # Errors carried by a task outcome.
///
/// A task finishes with `Ok(output)` or one of these. Work implementations pick
/// `Fail` or `Fatal` for their own failures; the core produces `Panicked` and
/// `State` itself.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Work failed; a caller may try again with a fresh task.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Non-recoverable failure.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Work noticed a cancellation request and stopped.
    #[error("task cancelled")]
    Canceled,

    /// Work panicked; the panic was caught by the core.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// Work hit a lifecycle contract violation (e.g. a sub-task rejected `run`).
    #[error(transparent)]
    State(#[from] StateError),
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`TaskError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        TaskError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tasktree::TaskError;
    ///
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Canceled => "task_canceled",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::State(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Canceled => "task cancelled".to_string(),
            TaskError::Panicked { info } => format!("panic: {info}"),
            TaskError::State(e) => e.as_message(),
        }
    }

    /// Indicates whether the failure came from the core rather than from work.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, TaskError::State(_) | TaskError::Panicked { .. })
    }
}

/// # Errors raised while wiring executors.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// No tokio runtime is available on the current thread.
    #[error("no tokio runtime available: {reason}")]
    NoRuntime {
        /// Details reported by tokio.
        reason: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NoRuntime { .. } => "runtime_missing",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::NoRuntime { reason } => format!("no runtime: {reason}"),
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_error_converts_into_task_error() {
        let err: TaskError = StateError::AlreadyStarted {
            task: "child".into(),
        }
        .into();

        assert!(err.is_contract_violation());
        assert_eq!(err.as_label(), "state_already_started");
        assert_eq!(err.to_string(), "task \"child\" was already started");
    }

    #[test]
    fn work_failures_are_not_contract_violations() {
        assert!(!TaskError::fail("io").is_contract_violation());
        assert!(!TaskError::fatal("disk").is_contract_violation());
        assert!(!TaskError::Canceled.is_contract_violation());
        assert_eq!(TaskError::fatal("disk").as_message(), "fatal: disk");
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let caught = std::panic::catch_unwind(|| panic!("boom {}", 7)).unwrap_err();
        assert_eq!(panic_message(&*caught), "boom 7");

        let caught = std::panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(&*caught), "static");
    }

    #[test]
    fn type_mismatch_reports_both_types() {
        let err = StateError::TypeMismatch {
            expected: "a::Fetch",
            actual: "b::Parse",
        };
        assert_eq!(
            err.to_string(),
            "type mismatch: expected a::Fetch, task holds b::Parse"
        );
    }
}

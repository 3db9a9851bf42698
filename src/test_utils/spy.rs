use std::sync::Arc;

use parking_lot::Mutex;

use crate::executors::{Executor, TaskHandle};
use crate::tasks::TaskId;

/// What the spy does with the handles it receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// Keep the handle; the test decides when (or whether) it runs.
    Hold,
    /// Execute the handle before returning, like `InlineExecutor`.
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Execute(TaskId),
    Cancel(TaskId),
}

/// Executor test double that records every call.
pub(crate) struct SpyExecutor {
    mode: Mode,
    calls: Mutex<Vec<Call>>,
    held: Mutex<Vec<TaskHandle>>,
}

impl SpyExecutor {
    pub(crate) fn new(mode: Mode) -> Self {
        Self {
            mode,
            calls: Mutex::new(Vec::new()),
            held: Mutex::new(Vec::new()),
        }
    }

    /// Returns the spy and the same spy as a bindable executor.
    pub(crate) fn shared(mode: Mode) -> (Arc<Self>, Arc<dyn Executor>) {
        let spy = Arc::new(Self::new(mode));
        let exec: Arc<dyn Executor> = spy.clone();
        (spy, exec)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub(crate) fn executed(&self) -> Vec<TaskId> {
        self.filter(|call| match call {
            Call::Execute(id) => Some(*id),
            Call::Cancel(_) => None,
        })
    }

    pub(crate) fn cancelled(&self) -> Vec<TaskId> {
        self.filter(|call| match call {
            Call::Cancel(id) => Some(*id),
            Call::Execute(_) => None,
        })
    }

    /// Takes the handles held so far (mode [`Mode::Hold`]).
    pub(crate) fn take_held(&self) -> Vec<TaskHandle> {
        std::mem::take(&mut *self.held.lock())
    }

    fn filter(&self, f: impl Fn(&Call) -> Option<TaskId>) -> Vec<TaskId> {
        self.calls.lock().iter().filter_map(f).collect()
    }
}

impl Executor for SpyExecutor {
    fn execute(&self, task: TaskHandle) {
        self.calls.lock().push(Call::Execute(task.id()));
        match self.mode {
            Mode::Hold => self.held.lock().push(task),
            Mode::Inline => {
                task.execute();
            }
        }
    }

    fn cancel(&self, task: TaskId) {
        self.calls.lock().push(Call::Cancel(task));
    }

    fn name(&self) -> &'static str {
        "spy"
    }
}

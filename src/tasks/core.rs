//! # Shared task state.
//!
//! Every [`Task`] owns one `Arc<Inner<W>>`. Everything else only holds weak
//! references to it:
//!
//! ```text
//! Task<W> (owner, unique) ──Arc──► Inner<W> ─┬─ Node    identity, executor binding, bus, children
//!                                             ├─ W       the work
//!   TaskHandle ───Weak──────────┘             ├─ Signal  one-shot outcome
//!   SubTask<W> ───Weak──────────┘             └─ callback (taken on completion)
//!   Completion<T> ─Weak─────────┘
//! ```
//!
//! ## Rules
//! - Only the owner's drop tears a task down: cancel request first, then the
//!   children in reverse creation order.
//! - An executor running the work upgrades its handle for the duration of the
//!   call, so the shared state stays valid even if the owner drops meanwhile.
//! - The work executes at most once per task; completion happens at most once.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::config::ExecutorGonePolicy;
use crate::error::{StateError, TaskError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::executors::{Executor, TaskHandle};
use crate::tasks::callback::{AnyTask, TaskCallback};
use crate::tasks::context::TaskContext;
use crate::tasks::signal::Signal;
use crate::tasks::{Outcome, SubTask, Task, TaskId, Work};

/// Anything a parent can own as a child, regardless of its work type.
pub(crate) trait OwnedTask: Send + Sync {
    fn id(&self) -> TaskId;
}

/// Executor-facing side of a task.
pub(crate) trait Runnable: Send + Sync {
    /// Executes the work on the current thread. Returns `false` if the work
    /// already ran.
    fn execute(self: Arc<Self>) -> bool;

    /// Completes the task with [`TaskError::Canceled`] instead of executing it.
    /// Returns `false` if the work already ran or the task is already done.
    fn cancel(&self) -> bool;

    fn is_done(&self) -> bool;
}

/// Completion side of a task, erased down to its output type.
pub(crate) trait Complete<T>: Send + Sync {
    fn node(&self) -> &Node;

    fn complete(&self, outcome: Outcome<T>) -> Result<(), StateError>;

    fn is_done(&self) -> bool;
}

/// Settings a parent hands down to the sub-tasks it creates.
#[derive(Clone, Default)]
pub(crate) struct Inherited {
    pub(crate) executor: Option<Weak<dyn Executor>>,
    pub(crate) bus: Option<Bus>,
    pub(crate) policy: ExecutorGonePolicy,
}

/// State of the executor binding at the time of a call.
enum Binding {
    Unbound,
    Live(Arc<dyn Executor>),
    Gone,
}

/// Work-type independent part of a task.
pub(crate) struct Node {
    pub(crate) id: TaskId,
    pub(crate) name: Arc<str>,
    executor: RwLock<Option<Weak<dyn Executor>>>,
    bus: Option<Bus>,
    policy: ExecutorGonePolicy,
    started: AtomicBool,
    executing: AtomicBool,
    children: Mutex<Vec<Box<dyn OwnedTask>>>,
}

impl Node {
    fn new(name: Arc<str>, inherited: Inherited) -> Self {
        Self {
            id: TaskId::next(),
            name,
            executor: RwLock::new(inherited.executor),
            bus: inherited.bus,
            policy: inherited.policy,
            started: AtomicBool::new(false),
            executing: AtomicBool::new(false),
            children: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_executor(&self, executor: Weak<dyn Executor>) {
        *self.executor.write() = Some(executor);
    }

    pub(crate) fn clear_executor(&self) {
        *self.executor.write() = None;
    }

    fn binding(&self) -> Binding {
        match self.executor.read().as_ref() {
            None => Binding::Unbound,
            Some(weak) => match weak.upgrade() {
                Some(executor) => Binding::Live(executor),
                None => Binding::Gone,
            },
        }
    }

    fn inherit(&self) -> Inherited {
        Inherited {
            executor: self.executor.read().clone(),
            bus: self.bus.clone(),
            policy: self.policy,
        }
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind)
            .with_task(Arc::clone(&self.name))
            .with_task_id(self.id)
    }

    /// Bus of this task, if one is attached and someone listens.
    fn listened_bus(&self) -> Option<&Bus> {
        self.bus.as_ref().filter(|bus| bus.has_receivers())
    }

    fn publish(&self, kind: EventKind, reason: Option<&str>) {
        if let Some(bus) = self.listened_bus() {
            let ev = self.event(kind);
            bus.publish(match reason {
                Some(reason) => ev.with_reason(reason),
                None => ev,
            });
        }
    }

    /// Builds a child task bound like this one and takes ownership of it.
    pub(crate) fn adopt<C: Work>(&self, work: C, callback: Option<TaskCallback>) -> SubTask<C> {
        let child = Task::from_parts(work, callback, None, self.inherit());
        let handle = child.downgrade();

        debug!(parent = %self.id, task = %child.name(), id = %child.id(), "sub-task created");
        if let Some(bus) = self.listened_bus() {
            bus.publish(
                Event::new(EventKind::SubTaskCreated)
                    .with_task(child.name())
                    .with_task_id(child.id())
                    .with_parent(self.id),
            );
        }

        self.children.lock().push(Box::new(child));
        handle
    }

    pub(crate) fn child_ids(&self) -> Vec<TaskId> {
        self.children.lock().iter().map(|c| c.id()).collect()
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.lock().len()
    }

    /// Requests cancellation from a live executor, then drops every child.
    pub(crate) fn teardown(&self) {
        let binding = self.executor.write().take();
        if let Some(weak) = binding {
            match weak.upgrade() {
                Some(executor) => {
                    debug!(task = %self.name, id = %self.id, executor = executor.name(), "requesting cancellation");
                    self.publish(EventKind::CancelRequested, Some(executor.name()));
                    executor.cancel(self.id);
                }
                None => {
                    debug!(task = %self.name, id = %self.id, "executor already dropped; nothing to cancel");
                    self.publish(EventKind::ExecutorGone, Some("drop"));
                }
            }
        }

        let children = std::mem::take(&mut *self.children.lock());
        for child in children.into_iter().rev() {
            drop(child);
        }
    }
}

/// Shared state of one task.
pub(crate) struct Inner<W: Work> {
    pub(crate) node: Node,
    pub(crate) work: W,
    signal: Signal<W::Output>,
    callback: Mutex<Option<TaskCallback>>,
}

impl<W: Work> Inner<W> {
    pub(crate) fn new(
        work: W,
        callback: Option<TaskCallback>,
        name: Option<Arc<str>>,
        inherited: Inherited,
    ) -> Arc<Self> {
        let name = name.unwrap_or_else(|| Arc::from(work.name()));
        Arc::new(Self {
            node: Node::new(name, inherited),
            work,
            signal: Signal::new(),
            callback: Mutex::new(callback),
        })
    }

    pub(crate) fn handle(self: &Arc<Self>) -> TaskHandle {
        let weak: Weak<Self> = Arc::downgrade(self);
        let runnable: Weak<dyn Runnable> = weak;
        TaskHandle::new(self.node.id, Arc::clone(&self.node.name), runnable)
    }

    /// Dispatches the work: to the bound executor, or inline.
    ///
    /// A task runs at most once. A run refused because the executor is gone
    /// does not count, so the task can be rebound and run again.
    pub(crate) fn run(self: &Arc<Self>, force_synchronous: bool) -> Result<(), StateError> {
        if self.node.started.swap(true, Ordering::AcqRel) {
            warn!(task = %self.node.name, id = %self.node.id, "run called on a started task");
            return Err(StateError::AlreadyStarted {
                task: self.node.name.to_string(),
            });
        }

        if !force_synchronous {
            match self.node.binding() {
                Binding::Live(executor) => {
                    debug!(task = %self.node.name, id = %self.node.id, executor = executor.name(), "scheduling");
                    self.node
                        .publish(EventKind::TaskScheduled, Some(executor.name()));
                    executor.execute(self.handle());
                    return Ok(());
                }
                Binding::Gone => {
                    self.node.publish(EventKind::ExecutorGone, Some("run"));
                    match self.node.policy {
                        ExecutorGonePolicy::Reject => {
                            warn!(task = %self.node.name, id = %self.node.id, "executor dropped; run rejected");
                            self.node.started.store(false, Ordering::Release);
                            return Err(StateError::ExecutorGone {
                                task: self.node.name.to_string(),
                            });
                        }
                        ExecutorGonePolicy::RunInline => {
                            warn!(task = %self.node.name, id = %self.node.id, "executor dropped; running inline");
                        }
                    }
                }
                Binding::Unbound => {}
            }
        }

        Runnable::execute(Arc::clone(self));
        Ok(())
    }

    fn finish(&self, outcome: Outcome<W::Output>, report_rejection: bool) -> Result<(), StateError> {
        let failure = outcome.as_ref().err().map(ToString::to_string);

        if self.signal.fire(outcome).is_err() {
            if report_rejection {
                warn!(task = %self.node.name, id = %self.node.id, "completion rejected: task already completed");
                self.node.publish(EventKind::CompletionRejected, None);
            }
            return Err(StateError::AlreadyCompleted {
                task: self.node.name.to_string(),
            });
        }

        match failure {
            None => {
                debug!(task = %self.node.name, id = %self.node.id, "completed");
                self.node.publish(EventKind::TaskCompleted, None);
            }
            Some(reason) => {
                debug!(task = %self.node.name, id = %self.node.id, error = %reason, "failed");
                self.node.publish(EventKind::TaskFailed, Some(reason.as_str()));
            }
        }

        let callback = self.callback.lock().take();
        if let Some(callback) = callback {
            callback(self as &dyn AnyTask);
        }
        Ok(())
    }

    pub(crate) fn outcome(&self) -> Option<&Outcome<W::Output>> {
        self.signal.get()
    }

    pub(crate) fn wait(&self) -> &Outcome<W::Output> {
        self.signal.wait()
    }

    pub(crate) async fn wait_async(&self) -> &Outcome<W::Output> {
        self.signal.wait_async().await
    }
}

impl<W: Work> Runnable for Inner<W> {
    fn execute(self: Arc<Self>) -> bool {
        if self.node.executing.swap(true, Ordering::AcqRel) {
            warn!(task = %self.node.name, id = %self.node.id, "second execution ignored");
            return false;
        }
        self.node.started.store(true, Ordering::Release);
        self.node.publish(EventKind::TaskStarting, None);

        let task: Arc<Self> = Arc::clone(&self);
        let ctx = TaskContext::new(task);
        let failure = match panic::catch_unwind(AssertUnwindSafe(|| self.work.execute(&ctx))) {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(payload) => {
                let info = panic_message(&*payload);
                error!(task = %self.node.name, id = %self.node.id, panic = %info, "work panicked");
                Some(TaskError::Panicked { info })
            }
        };

        if let Some(err) = failure {
            if self.finish(Err(err.clone()), false).is_err() {
                warn!(
                    task = %self.node.name,
                    id = %self.node.id,
                    error = %err,
                    "work failed after completing; error dropped"
                );
            }
        }
        true
    }

    fn cancel(&self) -> bool {
        if self.node.executing.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.node.started.store(true, Ordering::Release);
        debug!(task = %self.node.name, id = %self.node.id, "settled as canceled without executing");
        self.finish(Err(TaskError::Canceled), false).is_ok()
    }

    fn is_done(&self) -> bool {
        self.signal.is_fired()
    }
}

impl<W: Work> Complete<W::Output> for Inner<W> {
    fn node(&self) -> &Node {
        &self.node
    }

    fn complete(&self, outcome: Outcome<W::Output>) -> Result<(), StateError> {
        self.finish(outcome, true)
    }

    fn is_done(&self) -> bool {
        self.signal.is_fired()
    }
}

impl<W: Work> AnyTask for Inner<W> {
    fn id(&self) -> TaskId {
        self.node.id
    }

    fn name(&self) -> &str {
        &self.node.name
    }

    fn is_done(&self) -> bool {
        self.signal.is_fired()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<W>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

//! # Example: custom_subscriber
//!
//! Demonstrates how to build and attach a custom event subscriber.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait.
//! - Inspect [`Event`] / [`EventKind`] for task lifecycle metrics.
//! - Wire subscribers to a task tree through a [`Bus`] and [`SubscriberSet`].
//!
//! ## Flow
//! ```text
//! Task::builder(work).bus(bus)
//!     ├─► publish(TaskScheduled / TaskStarting / SubTaskCreated / ...)
//!     ├─► publish(TaskCompleted | TaskFailed)
//!     └─► drop ─► publish(CancelRequested) per task
//!
//! SubscriberSet::listen()
//!     └─► emit_arc() ──► LogWriter.on_event()
//!                    └─► Tally.on_event()
//! ```
//!
//! ## Run
//! Requires the `logging` feature to export [`LogWriter`].
//! ```bash
//! RUST_LOG=debug cargo run --example custom_subscriber --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tasktree::{
    Bus, Config, Event, EventKind, Executor, LogWriter, Subscribe, SubscriberSet, Task,
    TaskContext, TaskError, TokioExecutor, WorkFn,
};
use tracing_subscriber::EnvFilter;

/// Counts completions and failures; prints failures as they arrive.
#[derive(Default)]
struct Tally {
    completed: AtomicUsize,
    failed: AtomicUsize,
}

#[async_trait::async_trait]
impl Subscribe for Tally {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::TaskCompleted => {
                self.completed.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::TaskFailed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                println!(
                    "[tally] failed: task={} reason={}",
                    ev.task.as_deref().unwrap_or("<unknown>"),
                    ev.reason.as_deref().unwrap_or("<none>")
                );
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "tally"
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = Config::default();
    let bus: Bus = cfg.bus();
    let tally = Arc::new(Tally::default());

    let mut subs = SubscriberSet::new(
        vec![
            Arc::new(LogWriter) as Arc<dyn Subscribe>,
            Arc::clone(&tally) as Arc<dyn Subscribe>,
        ],
        bus.clone(),
    );
    subs.listen();

    let exec: Arc<dyn Executor> = Arc::new(TokioExecutor::try_current()?);

    let job = Task::builder(WorkFn::new(
        "job",
        |ctx: &TaskContext<u32>| -> Result<(), TaskError> {
            let ok = ctx.create_task(WorkFn::new(
                "step-ok",
                |ctx: &TaskContext<u32>| -> Result<(), TaskError> {
                    ctx.mark_as_done(Ok(1))?;
                    Ok(())
                },
            ));
            let bad = ctx.create_task(WorkFn::new(
                "step-bad",
                |_: &TaskContext<u32>| -> Result<(), TaskError> {
                    Err(TaskError::fail("bad input"))
                },
            ));

            ok.run()?;
            bad.run()?;
            let done = ok.get_results()?.unwrap_or(0) + bad.get_results()?.unwrap_or(0);
            ctx.mark_as_done(Ok(done))?;
            Ok(())
        },
    ))
    .executor(&exec)
    .bus(bus.clone())
    .config(&cfg)
    .build();

    job.run()?;
    println!("[main] job result: {:?}", job.wait_async().await.get_results());
    drop(job);

    // Let the subscribers drain before shutting down.
    tokio::time::sleep(Duration::from_millis(100)).await;
    subs.shutdown().await;

    println!(
        "[main] completed={} failed={}",
        tally.completed.load(Ordering::Relaxed),
        tally.failed.load(Ordering::Relaxed)
    );
    Ok(())
}

//! # Example: fan_out
//!
//! Demonstrates a task tree running on the tokio blocking pool.
//!
//! Shows how to:
//! - Implement [`Work`] for a parent that fans out into sub-tasks.
//! - Bind a [`TokioExecutor`] once; sub-tasks inherit it.
//! - Collect sub-task results and complete the parent with them.
//!
//! ## Flow
//! ```text
//! main ──► Task<Crawl>::run() ──► TokioExecutor ──► Crawl::execute (blocking pool)
//!                                                      ├─► create_task(Fetch) × N
//!                                                      ├─► run() each  ──► TokioExecutor
//!                                                      ├─► wait() each
//!                                                      └─► mark_as_done(total)
//! main ◄── wait_async() ◄─────────────────────────────────┘
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=tasktree=debug cargo run --example fan_out
//! ```

use std::sync::Arc;
use std::time::Duration;

use tasktree::{Executor, Task, TaskContext, TaskError, TokioExecutor, Work};
use tracing_subscriber::EnvFilter;

/// Pretends to download a page and reports its size.
struct Fetch {
    url: String,
}

impl Work for Fetch {
    type Output = usize;

    fn name(&self) -> &str {
        &self.url
    }

    fn execute(&self, ctx: &TaskContext<usize>) -> Result<(), TaskError> {
        std::thread::sleep(Duration::from_millis(50));
        if self.url.ends_with("/missing") {
            return Err(TaskError::fail(format!("404 for {}", self.url)));
        }
        ctx.mark_as_done(Ok(self.url.len() * 100))?;
        Ok(())
    }
}

/// Fetches every url concurrently and sums the sizes of the pages that loaded.
struct Crawl {
    urls: Vec<String>,
}

impl Work for Crawl {
    type Output = usize;

    fn name(&self) -> &str {
        "crawl"
    }

    fn execute(&self, ctx: &TaskContext<usize>) -> Result<(), TaskError> {
        let fetches: Vec<_> = self
            .urls
            .iter()
            .map(|url| ctx.create_task(Fetch { url: url.clone() }))
            .collect();

        for fetch in &fetches {
            fetch.run()?;
        }

        let mut total = 0;
        for fetch in &fetches {
            match fetch.get_results()? {
                Ok(size) => total += size,
                Err(e) => println!("[crawl] skipped {}: {e}", fetch.name()),
            }
        }

        ctx.mark_as_done(Ok(total))?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let exec: Arc<dyn Executor> = Arc::new(TokioExecutor::try_current()?);

    let urls = ["https://a.example/", "https://b.example/missing", "https://c.example/docs"]
        .map(String::from)
        .to_vec();

    let task = Task::builder(Crawl { urls })
        .executor(&exec)
        .on_complete(|done| {
            println!("[callback] {} finished: {:?}", done.name(), done.outcome());
        })
        .build();

    task.run()?;
    let total = task.wait_async().await.get_results().clone()?;
    println!("[main] crawled {total} bytes across {} fetches", task.sub_task_ids().len());

    Ok(())
}

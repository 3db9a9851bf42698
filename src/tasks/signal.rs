//! # One-shot completion signal.
//!
//! Stores a task [`Outcome`] exactly once and wakes every waiter.
//!
//! ```text
//! fire(outcome) ──► OnceLock::set ──► watch::send_replace(true) ──► waiters wake
//!                       │
//!                       └─ already set → Err(outcome) (caller reports the violation)
//! ```
//!
//! ## Rules
//! - The value is written before the flag flips, so a waiter that observes the
//!   flag also observes the value and everything written before `fire`.
//! - Any number of blocking or async waiters are supported.

use std::sync::OnceLock;

use tokio::sync::watch;

use crate::tasks::Outcome;

pub(crate) struct Signal<T> {
    slot: OnceLock<Outcome<T>>,
    done: watch::Sender<bool>,
}

impl<T> Signal<T> {
    pub(crate) fn new() -> Self {
        let (done, _rx) = watch::channel(false);
        Self {
            slot: OnceLock::new(),
            done,
        }
    }

    /// Stores the outcome and wakes all waiters.
    ///
    /// Returns the outcome back if the signal was already fired.
    pub(crate) fn fire(&self, outcome: Outcome<T>) -> Result<(), Outcome<T>> {
        self.slot.set(outcome)?;
        self.done.send_replace(true);
        Ok(())
    }

    pub(crate) fn get(&self) -> Option<&Outcome<T>> {
        self.slot.get()
    }

    pub(crate) fn is_fired(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Blocks the calling thread until the signal fires.
    pub(crate) fn wait(&self) -> &Outcome<T> {
        loop {
            if let Some(outcome) = self.slot.get() {
                return outcome;
            }
            let mut rx = self.done.subscribe();
            let _ = futures::executor::block_on(rx.wait_for(|done| *done));
        }
    }

    /// Waits asynchronously until the signal fires.
    pub(crate) async fn wait_async(&self) -> &Outcome<T> {
        loop {
            if let Some(outcome) = self.slot.get() {
                return outcome;
            }
            let mut rx = self.done.subscribe();
            let _ = rx.wait_for(|done| *done).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn fires_only_once() {
        let signal = Signal::<u8>::new();
        assert!(signal.fire(Ok(1)).is_ok());
        assert_eq!(signal.fire(Ok(2)), Err(Ok(2)));
        assert_eq!(signal.get(), Some(&Ok(1)));
    }

    #[test]
    fn wait_after_fire_returns_immediately() {
        let signal = Signal::<u8>::new();
        signal.fire(Err(TaskError::Canceled)).expect("first fire");
        assert_eq!(signal.wait(), &Err(TaskError::Canceled));
        assert_eq!(signal.wait(), &Err(TaskError::Canceled));
    }

    #[test]
    fn wakes_every_blocked_waiter() {
        let signal = Arc::new(Signal::<u32>::new());

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let s = Arc::clone(&signal);
                std::thread::spawn(move || s.wait().clone())
            })
            .collect();

        std::thread::sleep(Duration::from_millis(20));
        assert!(!signal.is_fired());
        signal.fire(Ok(7)).expect("fire");

        for w in waiters {
            assert_eq!(w.join().expect("waiter"), Ok(7));
        }
    }

    #[tokio::test]
    async fn async_waiter_wakes_on_fire() {
        let signal = Arc::new(Signal::<&'static str>::new());
        let s = Arc::clone(&signal);
        let waiter = tokio::spawn(async move { s.wait_async().await.clone() });

        tokio::task::yield_now().await;
        signal.fire(Ok("done")).expect("fire");
        assert_eq!(waiter.await.expect("join"), Ok("done"));
    }
}

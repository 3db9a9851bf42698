//! # Task configuration.
//!
//! Provides [`Config`], the settings a root task hands down to every sub-task it creates.
//!
//! Config is used in two ways:
//! 1. **Bus creation**: `Config::bus()` builds an event bus with the configured capacity
//! 2. **Task creation**: `Task::builder(work).config(&cfg)` applies the policies to a task tree
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1 by [`Config::bus_capacity_clamped`]

use crate::events::Bus;

/// What `run()` does when the executor bound to a task has already been dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutorGonePolicy {
    /// Refuse to run and return [`StateError::ExecutorGone`](crate::StateError::ExecutorGone) (default).
    #[default]
    Reject,
    /// Fall back to synchronous execution on the calling thread.
    RunInline,
}

/// Configuration shared by a task tree.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped)
/// - `on_executor_gone`: Behavior of `run()` when the executor binding expired
///
/// ## Notes
/// All fields are public. Sub-tasks inherit the policy of their parent; the
/// capacity only matters when a bus is built from this config.
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// skip older items.
    pub bus_capacity: usize,

    /// Behavior of `run()` on a task whose executor has been dropped.
    pub on_executor_gone: ExecutorGonePolicy,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Builds a fresh event bus sized by this config.
    pub fn bus(&self) -> Bus {
        Bus::new(self.bus_capacity_clamped())
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `on_executor_gone = ExecutorGonePolicy::Reject`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            on_executor_gone: ExecutorGonePolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reject_when_executor_is_gone() {
        let cfg = Config::default();
        assert_eq!(cfg.bus_capacity, 1024);
        assert_eq!(cfg.on_executor_gone, ExecutorGonePolicy::Reject);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}

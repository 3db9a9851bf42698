//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by tasks and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Task` (run/execute/complete/drop), `TaskContext::create_task`,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `SubscriberSet::listen` (fans out to user subscribers) or any
//!   receiver obtained from [`Bus::subscribe`].
//!
//! A task only publishes when a bus was attached through its builder; sub-tasks
//! inherit the bus of their parent.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};

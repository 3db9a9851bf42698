//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in implementations for handling task events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Task ── publish(Event) ──► Bus ──► SubscriberSet::listen
//!                                          │
//!                                          ├──► [queue] ──► Subscribe::on_event(&Event)
//!                                          │                     │
//!                                          │          ┌──────────┼─────────┐
//!                                          │          ▼          ▼         ▼
//!                                          │      LogWriter   Metrics   Custom
//!                                          └──► ...
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use tasktree::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct FailureCounter;
//!
//! #[async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, event: &Event) {
//!         if let EventKind::TaskFailed = event.kind {
//!             // increment failure counter
//!         }
//!     }
//! }
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;

// SPDX-FileCopyrightText: 2026 Glossa Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for the Glossa translation service.
//!
//! - [`WorkQueue`] admits tasks FIFO under a concurrency cap and a fixed-window
//!   start-rate cap, and bounds each task with a timeout.
//! - [`retry_with_backoff`] re-runs an operation with exponential delays while
//!   its failures are classified as retryable.

pub mod backoff;
pub mod queue;

pub use backoff::{retry_with_backoff, BackoffPolicy, RetryError};
pub use queue::{QueueError, QueueSettings, QueueStats, WorkQueue};

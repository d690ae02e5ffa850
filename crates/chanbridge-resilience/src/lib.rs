// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for the chanbridge connector.
//!
//! - [`ExponentialBackoff`]: a jittered, capped, growing delay sequence.
//! - [`retry_notify`]: runs a fallible task forever, sleeping for the next
//!   backoff delay after each failure and reporting it to a callback, until
//!   the task succeeds or the cancellation token fires.

pub mod backoff;
pub mod supervisor;

pub use backoff::{BackoffPolicy, ExponentialBackoff};
pub use supervisor::retry_notify;

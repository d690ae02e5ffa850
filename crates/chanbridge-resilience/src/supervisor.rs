// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unbounded retry supervision.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::backoff::BackoffPolicy;

/// Runs `operation` until it succeeds, retrying forever on failure.
///
/// After each failure `notify` receives the error and the delay about to be
/// slept, then the supervisor waits that long and tries again. An attempt
/// that ran for longer than the policy's max delay counts as a recovery and
/// resets the backoff sequence before the next delay is drawn.
///
/// Returns `Some(value)` on success and `None` once `cancel` fires, whether
/// during an attempt or during a backoff sleep.
pub async fn retry_notify<T, E, F, Fut, N, P>(
    policy: &mut P,
    mut operation: F,
    mut notify: N,
    cancel: &CancellationToken,
) -> Option<T>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    N: FnMut(&E, Duration),
    P: BackoffPolicy + ?Sized,
{
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        let started = Instant::now();
        let result = tokio::select! {
            result = operation() => result,
            _ = cancel.cancelled() => {
                debug!(attempt, "supervised task cancelled mid-attempt");
                return None;
            }
        };

        let err = match result {
            Ok(value) => return Some(value),
            Err(err) => err,
        };

        if started.elapsed() > policy.max_delay() {
            policy.reset();
        }
        let delay = policy.next_delay();
        notify(&err, delay);

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {
                debug!(attempt, "supervised task cancelled during backoff");
                return None;
            }
        }
    }
}

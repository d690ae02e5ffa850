// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event writer that records everything it is asked to send.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use chanbridge_core::{ChanbridgeError, EventWriter, OutboundEvent};

/// Captures sent events for assertions.
///
/// Failed or delayed sends are scripted with [`fail_next`](Self::fail_next)
/// and [`set_delay`](Self::set_delay). Failed sends are not recorded.
#[derive(Default)]
pub struct RecordingWriter {
    events: Mutex<Vec<OutboundEvent>>,
    fail_next: AtomicUsize,
    delay: Mutex<Option<Duration>>,
    attempts: AtomicUsize,
    closed: AtomicBool,
    notify: Notify,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock() = delay;
    }

    /// Successfully written events, in order.
    pub fn events(&self) -> Vec<OutboundEvent> {
        self.events.lock().clone()
    }

    /// Number of `send` calls, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Waits until at least `count` events were recorded or `timeout` elapses.
    ///
    /// Returns the recorded events either way.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<OutboundEvent> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.notify.notified();
            let events = self.events();
            if events.len() >= count {
                return events;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.events();
            }
        }
    }
}

#[async_trait]
impl EventWriter for RecordingWriter {
    async fn send(&self, event: OutboundEvent) -> Result<(), ChanbridgeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(ChanbridgeError::writer(format!(
                "injected send failure for {}",
                event.id
            )));
        }
        self.events.lock().push(event);
        self.notify.notify_waiters();
        Ok(())
    }

    async fn close(&self) -> Result<(), ChanbridgeError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat backend for deterministic testing.
//!
//! `MockBackend` implements `ChatBackend` with injectable updates, scripted
//! join/leave failures, and logs of every call for assertions.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use chanbridge_core::{
    AdapterType, Channel, ChanbridgeError, ChatBackend, ChatUser, HealthStatus, PluginAdapter,
    UpdateEvent,
};

/// A scripted chat backend.
///
/// Joins succeed unless a failure was scripted for that channel with
/// [`fail_joins`](Self::fail_joins). Updates injected with
/// [`inject_update`](Self::inject_update) are returned by `next_update` in
/// order; after [`close_stream`](Self::close_stream) the queue drains and
/// then `next_update` reports `Closed`.
pub struct MockBackend {
    user: ChatUser,
    connected: AtomicBool,
    joined: Mutex<BTreeSet<i64>>,
    join_log: Mutex<Vec<i64>>,
    leave_log: Mutex<Vec<i64>>,
    join_failures: Mutex<HashMap<i64, usize>>,
    leave_failures: Mutex<HashMap<i64, usize>>,
    call_delay: Mutex<Option<Duration>>,
    updates: Mutex<VecDeque<UpdateEvent>>,
    stream_closed: AtomicBool,
    notify: Notify,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            user: ChatUser {
                id: 777,
                username: Some("chanbridge_test_bot".into()),
                display_name: "Chanbridge Test".into(),
            },
            connected: AtomicBool::new(false),
            joined: Mutex::new(BTreeSet::new()),
            join_log: Mutex::new(Vec::new()),
            leave_log: Mutex::new(Vec::new()),
            join_failures: Mutex::new(HashMap::new()),
            leave_failures: Mutex::new(HashMap::new()),
            call_delay: Mutex::new(None),
            updates: Mutex::new(VecDeque::new()),
            stream_closed: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Marks channels as already joined on the backend side.
    pub fn with_joined(self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.joined.lock().extend(ids);
        self
    }

    /// Makes the next `times` joins of `channel_id` fail.
    pub fn fail_joins(&self, channel_id: i64, times: usize) {
        self.join_failures.lock().insert(channel_id, times);
    }

    /// Makes the next `times` leaves of `channel_id` fail.
    pub fn fail_leaves(&self, channel_id: i64, times: usize) {
        self.leave_failures.lock().insert(channel_id, times);
    }

    /// Delays every join and leave by `delay` (for deadline tests).
    pub fn set_call_delay(&self, delay: Option<Duration>) {
        *self.call_delay.lock() = delay;
    }

    /// Queues an update for `next_update`.
    pub fn inject_update(&self, update: UpdateEvent) {
        self.updates.lock().push_back(update);
        self.notify.notify_one();
    }

    /// Ends the update stream once queued updates are drained.
    pub fn close_stream(&self) {
        self.stream_closed.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Channels the backend currently considers joined.
    pub fn joined(&self) -> BTreeSet<i64> {
        self.joined.lock().clone()
    }

    /// Every join attempt, successful or not, in call order.
    pub fn join_log(&self) -> Vec<i64> {
        self.join_log.lock().clone()
    }

    /// Every leave attempt, successful or not, in call order.
    pub fn leave_log(&self) -> Vec<i64> {
        self.leave_log.lock().clone()
    }

    fn take_failure(failures: &Mutex<HashMap<i64, usize>>, id: i64) -> bool {
        let mut failures = failures.lock();
        match failures.get_mut(&id) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    async fn delay(&self) {
        let delay = *self.call_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Backend
    }

    async fn health_check(&self) -> Result<HealthStatus, ChanbridgeError> {
        if !self.is_connected() {
            return Ok(HealthStatus::Unhealthy("not connected".into()));
        }
        if self.stream_closed.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("update stream closed".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ChanbridgeError> {
        self.close_stream();
        Ok(())
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn connect(&mut self) -> Result<(), ChanbridgeError> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn current_user(&self) -> Result<ChatUser, ChanbridgeError> {
        Ok(self.user.clone())
    }

    async fn join(&self, channel: &Channel) -> Result<(), ChanbridgeError> {
        self.join_log.lock().push(channel.id);
        self.delay().await;
        if Self::take_failure(&self.join_failures, channel.id) {
            return Err(ChanbridgeError::backend(format!(
                "scripted join failure for {}",
                channel.id
            )));
        }
        self.joined.lock().insert(channel.id);
        Ok(())
    }

    async fn leave(&self, channel_id: i64) -> Result<(), ChanbridgeError> {
        self.leave_log.lock().push(channel_id);
        self.delay().await;
        if Self::take_failure(&self.leave_failures, channel_id) {
            return Err(ChanbridgeError::backend(format!(
                "scripted leave failure for {channel_id}"
            )));
        }
        self.joined.lock().remove(&channel_id);
        Ok(())
    }

    async fn next_update(&self) -> Result<UpdateEvent, ChanbridgeError> {
        loop {
            let next = self.updates.lock().pop_front();
            if let Some(update) = next {
                return Ok(update);
            }
            if self.stream_closed.load(Ordering::SeqCst) {
                return Err(ChanbridgeError::Closed {
                    what: "mock update stream".into(),
                });
            }
            self.notify.notified().await;
        }
    }
}

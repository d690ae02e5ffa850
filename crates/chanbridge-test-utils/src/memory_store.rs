// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory channel store with call counters and failure injection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use chanbridge_core::{Channel, ChannelStore, ChanbridgeError};

/// A `ChannelStore` backed by a `BTreeMap`.
///
/// Failure injection:
/// - [`fail_next`](Self::fail_next) fails the next `n` calls of any kind.
/// - [`set_unreachable`](Self::set_unreachable) fails every call until reset.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<i64, Channel>>,
    fail_next: AtomicUsize,
    unreachable: AtomicBool,
    closed: AtomicBool,
    get_calls: AtomicUsize,
    put_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    list_calls: AtomicUsize,
    close_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with `channels`.
    pub fn with_channels(channels: impl IntoIterator<Item = Channel>) -> Self {
        let store = Self::new();
        for channel in channels {
            store.insert(channel);
        }
        store
    }

    /// Writes a record directly, bypassing counters and failure injection.
    pub fn insert(&self, channel: Channel) {
        self.records.lock().insert(channel.id, channel);
    }

    /// Removes a record directly.
    pub fn remove(&self, id: i64) {
        self.records.lock().remove(&id);
    }

    /// Returns a copy of every stored record.
    pub fn snapshot(&self) -> BTreeMap<i64, Channel> {
        self.records.lock().clone()
    }

    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    fn check(&self, op: &str) -> Result<(), ChanbridgeError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ChanbridgeError::storage(format!("{op}: store unreachable")));
        }
        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(ChanbridgeError::storage(format!("{op}: injected failure")));
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelStore for MemoryStore {
    async fn get(&self, id: i64) -> Result<Option<Channel>, ChanbridgeError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check("get")?;
        Ok(self.records.lock().get(&id).cloned())
    }

    async fn put(&self, channel: &Channel) -> Result<(), ChanbridgeError> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        self.check("put")?;
        self.insert(channel.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), ChanbridgeError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check("delete")?;
        self.remove(id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Channel>, ChanbridgeError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check("list")?;
        Ok(self.records.lock().values().cloned().collect())
    }

    async fn close(&self) -> Result<(), ChanbridgeError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

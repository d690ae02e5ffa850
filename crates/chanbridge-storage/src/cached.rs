// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded, time-expiring read cache in front of a [`ChannelStore`].
//!
//! Reads are served from an LRU map while the entry is younger than the TTL.
//! Writes go to the inner store first and only then touch the cache, so a
//! failed write can never leave the cache ahead of the durable record.
//! Writes are serialized so the cache refreshes in the order the inner store
//! applied them.
//! Overflow evicts the least recently *accessed* entry.

use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use lru::LruCache;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::trace;

use chanbridge_config::model::CacheConfig;
use chanbridge_core::{Channel, ChannelStore, ChanbridgeError};

struct Entry {
    channel: Channel,
    inserted_at: Instant,
}

impl Entry {
    fn new(channel: &Channel) -> Self {
        Self {
            channel: channel.clone(),
            inserted_at: Instant::now(),
        }
    }
}

struct CacheState {
    entries: LruCache<i64, Entry>,
    /// Bumped on every write so an in-flight read-through can tell that its
    /// result may be stale and skip populating the cache.
    generation: u64,
}

/// Read-through cache decorator.
pub struct CachedStore<S> {
    inner: S,
    state: Mutex<CacheState>,
    write_lock: tokio::sync::Mutex<()>,
    ttl: Duration,
}

impl<S: ChannelStore> CachedStore<S> {
    /// Wraps `inner` with a cache holding at most `capacity` fresh entries.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(inner: S, capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                generation: 0,
            }),
            write_lock: tokio::sync::Mutex::new(()),
            ttl,
        }
    }

    pub fn from_config(inner: S, config: &CacheConfig) -> Self {
        Self::new(inner, config.capacity, config.ttl())
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of entries currently held, fresh or not yet purged.
    pub fn cached_len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Returns `true` if a fresh entry for `id` is cached. Does not touch recency.
    pub fn is_cached(&self, id: i64) -> bool {
        let state = self.state.lock();
        state
            .entries
            .peek(&id)
            .is_some_and(|e| e.inserted_at.elapsed() < self.ttl)
    }

    fn lookup(&self, id: i64) -> Result<Channel, u64> {
        let mut state = self.state.lock();
        let expired = match state.entries.get(&id) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Ok(entry.channel.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            state.entries.pop(&id);
            trace!(id, "cache entry expired");
        }
        Err(state.generation)
    }

    fn fill(&self, channel: &Channel, seen_generation: u64) {
        let mut state = self.state.lock();
        if state.generation != seen_generation {
            return;
        }
        state.entries.put(channel.id, Entry::new(channel));
    }

    /// Drops the entry for `id` after a write and stores `refreshed` if the
    /// write succeeded.
    fn after_write(&self, id: i64, refreshed: Option<&Channel>) {
        let mut state = self.state.lock();
        state.generation = state.generation.wrapping_add(1);
        match refreshed {
            Some(channel) => {
                state.entries.put(id, Entry::new(channel));
            }
            None => {
                state.entries.pop(&id);
            }
        }
    }
}

#[async_trait]
impl<S: ChannelStore> ChannelStore for CachedStore<S> {
    async fn get(&self, id: i64) -> Result<Option<Channel>, ChanbridgeError> {
        let seen = match self.lookup(id) {
            Ok(channel) => return Ok(Some(channel)),
            Err(generation) => generation,
        };

        let found = self.inner.get(id).await?;
        if let Some(channel) = &found {
            self.fill(channel, seen);
        }
        Ok(found)
    }

    async fn put(&self, channel: &Channel) -> Result<(), ChanbridgeError> {
        let _write = self.write_lock.lock().await;
        let result = self.inner.put(channel).await;
        self.after_write(channel.id, result.as_ref().ok().map(|_| channel));
        result
    }

    async fn delete(&self, id: i64) -> Result<(), ChanbridgeError> {
        let _write = self.write_lock.lock().await;
        let result = self.inner.delete(id).await;
        self.after_write(id, None);
        result
    }

    async fn list(&self) -> Result<Vec<Channel>, ChanbridgeError> {
        self.inner.list().await
    }

    async fn close(&self) -> Result<(), ChanbridgeError> {
        self.state.lock().entries.clear();
        self.inner.close().await
    }
}

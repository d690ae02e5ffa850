// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory index of the channels this replica has joined.
//!
//! Readers take cheap immutable snapshots; the reconciler is the only writer.
//! The map is copy-on-write behind an `RwLock<Arc<..>>`, so a snapshot handed
//! out before a mutation never observes that mutation.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use chanbridge_core::Channel;

/// Concurrency-safe registry of joined channels keyed by chat id.
#[derive(Debug, Default)]
pub struct Registry {
    channels: RwLock<Arc<HashMap<i64, Channel>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an immutable view of the whole registry.
    pub fn snapshot(&self) -> Arc<HashMap<i64, Channel>> {
        Arc::clone(&self.channels.read())
    }

    pub fn get(&self, id: i64) -> Option<Channel> {
        self.channels.read().get(&id).cloned()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.channels.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Joined channels sorted by id.
    pub fn channels(&self) -> Vec<Channel> {
        let mut channels: Vec<Channel> = self.snapshot().values().cloned().collect();
        channels.sort_by_key(|c| c.id);
        channels
    }

    /// Inserts or replaces the entry for `channel.id`, returning the previous one.
    pub fn add(&self, channel: Channel) -> Option<Channel> {
        let mut guard = self.channels.write();
        Arc::make_mut(&mut guard).insert(channel.id, channel)
    }

    /// Removes the entry for `id`, returning it if present.
    pub fn remove(&self, id: i64) -> Option<Channel> {
        let mut guard = self.channels.write();
        if !guard.contains_key(&id) {
            return None;
        }
        Arc::make_mut(&mut guard).remove(&id)
    }
}

// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic partitioning of channels across replicas.

use chanbridge_config::replica::ReplicaIdentity;
use chanbridge_core::ChanbridgeError;

/// The subset of channel ids one replica is responsible for.
///
/// A channel belongs to the replica whose index equals
/// `id.rem_euclid(count)`. Euclidean remainder keeps negative Telegram ids
/// in `0..count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    index: u32,
    count: u32,
}

impl Shard {
    pub fn new(index: u32, count: u32) -> Result<Self, ChanbridgeError> {
        if count == 0 || index >= count {
            return Err(ChanbridgeError::Config(format!(
                "invalid shard {index}/{count}"
            )));
        }
        Ok(Self { index, count })
    }

    /// A shard that owns every channel.
    pub fn single() -> Self {
        Self { index: 0, count: 1 }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn owns(&self, channel_id: i64) -> bool {
        channel_id.rem_euclid(i64::from(self.count)) == i64::from(self.index)
    }
}

impl From<ReplicaIdentity> for Shard {
    fn from(identity: ReplicaIdentity) -> Self {
        Self {
            index: identity.index,
            count: identity.count,
        }
    }
}

impl std::fmt::Display for Shard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.index, self.count)
    }
}

// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel store capability set implemented by the durable store and its decorators.

use async_trait::async_trait;

use crate::error::ChanbridgeError;
use crate::types::Channel;

/// Key-value style store of channel records keyed by chat id.
///
/// The durable backend and every decorator around it implement this same
/// trait, so decorators compose without the caller knowing the stack.
/// Decorators must pass return values and errors through unchanged.
#[async_trait]
pub trait ChannelStore: Send + Sync + 'static {
    /// Returns the channel with the given id, or `None` when absent.
    async fn get(&self, id: i64) -> Result<Option<Channel>, ChanbridgeError>;

    /// Inserts or replaces the record for `channel.id`.
    async fn put(&self, channel: &Channel) -> Result<(), ChanbridgeError>;

    /// Removes the record. Deleting an absent id is not an error.
    async fn delete(&self, id: i64) -> Result<(), ChanbridgeError>;

    /// Returns every stored channel ordered by id.
    async fn list(&self) -> Result<Vec<Channel>, ChanbridgeError>;

    /// Releases connections and background resources.
    async fn close(&self) -> Result<(), ChanbridgeError>;
}

#[async_trait]
impl<T: ChannelStore + ?Sized> ChannelStore for std::sync::Arc<T> {
    async fn get(&self, id: i64) -> Result<Option<Channel>, ChanbridgeError> {
        (**self).get(id).await
    }

    async fn put(&self, channel: &Channel) -> Result<(), ChanbridgeError> {
        (**self).put(channel).await
    }

    async fn delete(&self, id: i64) -> Result<(), ChanbridgeError> {
        (**self).delete(id).await
    }

    async fn list(&self) -> Result<Vec<Channel>, ChanbridgeError> {
        (**self).list().await
    }

    async fn close(&self) -> Result<(), ChanbridgeError> {
        (**self).close().await
    }
}

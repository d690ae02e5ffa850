// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat backend trait (Telegram and test doubles).

use async_trait::async_trait;

use crate::error::ChanbridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Channel, ChatUser, UpdateEvent};

/// Client for the chat network the connector reads from.
///
/// Session and credential lifecycle is owned by the implementation. Every
/// method must be safe to call concurrently from the reconciler and the
/// update listener.
#[async_trait]
pub trait ChatBackend: PluginAdapter {
    /// Starts receiving updates. Called once before the first `next_update`.
    async fn connect(&mut self) -> Result<(), ChanbridgeError>;

    /// Returns the account the session is logged in as.
    async fn current_user(&self) -> Result<ChatUser, ChanbridgeError>;

    /// Joins the channel, or confirms an existing membership.
    async fn join(&self, channel: &Channel) -> Result<(), ChanbridgeError>;

    /// Leaves the channel with the given id.
    async fn leave(&self, channel_id: i64) -> Result<(), ChanbridgeError>;

    /// Waits for the next update from the live stream.
    ///
    /// Returns [`ChanbridgeError::Closed`] once the stream has ended.
    async fn next_update(&self) -> Result<UpdateEvent, ChanbridgeError>;
}

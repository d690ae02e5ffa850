// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Event-bus writer trait.

use async_trait::async_trait;

use crate::error::ChanbridgeError;
use crate::types::OutboundEvent;

/// Sink for outbound events. Delivery guarantees belong to the bus.
#[async_trait]
pub trait EventWriter: Send + Sync + 'static {
    /// Writes a single event.
    async fn send(&self, event: OutboundEvent) -> Result<(), ChanbridgeError>;

    /// Releases the writer's connections.
    async fn close(&self) -> Result<(), ChanbridgeError> {
        Ok(())
    }
}

#[async_trait]
impl<T: EventWriter + ?Sized> EventWriter for std::sync::Arc<T> {
    async fn send(&self, event: OutboundEvent) -> Result<(), ChanbridgeError> {
        (**self).send(event).await
    }

    async fn close(&self) -> Result<(), ChanbridgeError> {
        (**self).close().await
    }
}

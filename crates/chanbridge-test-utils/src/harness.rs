// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-wired collaborator doubles for connector tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use chanbridge_core::{Channel, UpdateEvent};

use crate::{MemoryStore, MockBackend, RecordingWriter};

/// Builds an update for `channel_id` with a fixed timestamp.
pub fn update(channel_id: i64, message_id: i64, text: &str) -> UpdateEvent {
    UpdateEvent {
        channel_id,
        message_id,
        sender: Some(format!("tg://user?id={}", 1000 + message_id)),
        payload: text.to_string(),
        timestamp: DateTime::<Utc>::from_timestamp(1_767_225_600 + message_id, 0)
            .unwrap_or_default(),
    }
}

/// A store, backend, and writer sharing one test's state.
///
/// # Example
///
/// ```rust,ignore
/// let harness = ConnectorHarness::new().with_desired([(100, "news"), (200, "ops")]);
/// harness.backend.inject_update(update(100, 1, "hello"));
/// ```
pub struct ConnectorHarness {
    pub store: Arc<MemoryStore>,
    pub backend: Arc<MockBackend>,
    pub writer: Arc<RecordingWriter>,
}

impl ConnectorHarness {
    pub fn new() -> Self {
        Self::from_backend(MockBackend::new())
    }

    /// Uses a pre-configured backend (for example one built `with_joined`).
    pub fn from_backend(backend: MockBackend) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            backend: Arc::new(backend),
            writer: Arc::new(RecordingWriter::new()),
        }
    }

    /// Seeds the store with the desired channels as `(id, group_id)` pairs.
    pub fn with_desired<'a>(self, channels: impl IntoIterator<Item = (i64, &'a str)>) -> Self {
        for (id, group) in channels {
            self.store.insert(Channel::new(id, group));
        }
        self
    }
}

impl Default for ConnectorHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanbridge_core::{ChannelStore, EventWriter, OutboundEvent};
    use std::time::Duration;

    #[tokio::test]
    async fn harness_seeds_store() {
        let harness = ConnectorHarness::new().with_desired([(100, "news"), (200, "ops")]);
        let ids: Vec<i64> = harness.store.list().await.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![100, 200]);
    }

    #[tokio::test]
    async fn writer_records_successful_sends_only() {
        let writer = RecordingWriter::new();
        let event = OutboundEvent {
            id: "1-1".into(),
            source: "tg://channel/1".into(),
            spec_version: "1.0".into(),
            event_type: "t".into(),
            group_id: "g".into(),
            subject: None,
            time: Utc::now(),
            text: "x".into(),
        };
        writer.fail_next(1);
        assert!(writer.send(event.clone()).await.is_err());
        writer.send(event).await.unwrap();
        assert_eq!(writer.attempts(), 2);
        assert_eq!(writer.wait_for(1, Duration::from_millis(10)).await.len(), 1);
    }
}

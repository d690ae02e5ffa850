// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the store, backend, writer, and connector crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A chat-network channel or group the connector may join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Chat-backend-native identifier. Telegram channel ids are negative.
    pub id: i64,
    /// Routing key naming the downstream interest group.
    pub group_id: String,
    /// Title or public link of the channel. May be empty.
    #[serde(default)]
    pub name: String,
    /// When the connector last confirmed a join for this channel.
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    /// When the record was last refreshed.
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Channel {
    /// Creates a channel record with no name and no timestamps.
    pub fn new(id: i64, group_id: impl Into<String>) -> Self {
        Self {
            id,
            group_id: group_id.into(),
            name: String::new(),
            joined_at: None,
            last_seen: None,
        }
    }

    /// Sets the human-readable name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Returns the event source for messages from this channel.
    ///
    /// Falls back to a `tg://channel/<id>` URI when the channel has no name.
    pub fn source(&self) -> String {
        if self.name.is_empty() {
            format!("tg://channel/{}", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// A single inbound message from the chat backend's live update stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEvent {
    pub channel_id: i64,
    pub message_id: i64,
    /// Sender identifier, absent for anonymous channel posts.
    pub sender: Option<String>,
    /// Text or caption of the message.
    pub payload: String,
    pub timestamp: DateTime<Utc>,
}

/// The structured event written to the downstream event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub id: String,
    pub source: String,
    pub spec_version: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub time: DateTime<Utc>,
    pub text: String,
}

/// The account the chat backend session is logged in as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: i64,
    pub username: Option<String>,
    pub display_name: String,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Backend,
    Storage,
    Writer,
    Observability,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_falls_back_to_uri() {
        let channel = Channel::new(-1001234, "news");
        assert_eq!(channel.source(), "tg://channel/-1001234");

        let named = channel.with_name("https://t.me/rustlang");
        assert_eq!(named.source(), "https://t.me/rustlang");
    }

    #[test]
    fn channel_deserializes_with_defaults() {
        let json = r#"{"id": 42, "group_id": "default"}"#;
        let channel: Channel = serde_json::from_str(json).unwrap();
        assert_eq!(channel, Channel::new(42, "default"));
    }

    #[test]
    fn outbound_event_uses_type_key() {
        let event = OutboundEvent {
            id: "1-2".into(),
            source: "tg://channel/1".into(),
            spec_version: "1.0".into(),
            event_type: "chanbridge.telegram.message.v1".into(),
            group_id: "g".into(),
            subject: None,
            time: DateTime::from_timestamp(0, 0).unwrap(),
            text: "hi".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "chanbridge.telegram.message.v1");
        assert!(json.get("subject").is_none());
    }

    #[test]
    fn adapter_type_parses_from_display() {
        use std::str::FromStr;
        for variant in [
            AdapterType::Backend,
            AdapterType::Storage,
            AdapterType::Writer,
            AdapterType::Observability,
        ] {
            assert_eq!(AdapterType::from_str(&variant.to_string()).unwrap(), variant);
        }
    }
}

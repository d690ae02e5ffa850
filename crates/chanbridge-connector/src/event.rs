// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of inbound chat updates into outbound bus events.

use chanbridge_core::{Channel, OutboundEvent, UpdateEvent};

/// Version of the event envelope format.
pub const EVENT_SPEC_VERSION: &str = "1.0";

/// Event type attached to every forwarded chat message.
pub const MESSAGE_EVENT_TYPE: &str = "chanbridge.telegram.message.v1";

/// Builds the outbound event for `update` using the routing key of `channel`.
///
/// Deterministic: the same update and channel always yield the same event.
pub fn to_outbound_event(update: &UpdateEvent, channel: &Channel) -> OutboundEvent {
    OutboundEvent {
        id: format!("{}-{}", update.channel_id, update.message_id),
        source: channel.source(),
        spec_version: EVENT_SPEC_VERSION.to_string(),
        event_type: MESSAGE_EVENT_TYPE.to_string(),
        group_id: channel.group_id.clone(),
        subject: update.sender.clone(),
        time: update.timestamp,
        text: update.payload.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chanbridge_test_utils::update;

    #[test]
    fn maps_every_field() {
        let channel = Channel::new(100, "news").with_name("https://t.me/news");
        let update = update(100, 7, "hello");
        let event = to_outbound_event(&update, &channel);

        assert_eq!(event.id, "100-7");
        assert_eq!(event.source, "https://t.me/news");
        assert_eq!(event.spec_version, "1.0");
        assert_eq!(event.event_type, MESSAGE_EVENT_TYPE);
        assert_eq!(event.group_id, "news");
        assert_eq!(event.subject, update.sender);
        assert_eq!(event.time, update.timestamp);
        assert_eq!(event.text, "hello");
    }

    #[test]
    fn unnamed_channel_uses_uri_source() {
        let channel = Channel::new(-1005, "ops");
        let mut update = update(-1005, 1, "");
        update.sender = None;
        let event = to_outbound_event(&update, &channel);
        assert_eq!(event.id, "-1005-1");
        assert_eq!(event.source, "tg://channel/-1005");
        assert_eq!(event.subject, None);
    }
}

// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of Telegram messages into connector update events.
//!
//! Only group, supergroup, and channel messages with text or a caption are
//! turned into updates. Private chats are never forwarded.

use teloxide::types::{ChatKind, Message};

use chanbridge_core::UpdateEvent;

/// Returns `true` for messages posted in a group, supergroup, or channel.
pub fn is_public_chat(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Public(_))
}

/// Identifies who posted the message.
///
/// Users map to `tg://user?id=<id>`. Anonymous channel posts and admins
/// posting as the chat map to `tg://channel/<id>` of the sender chat.
pub fn sender_of(msg: &Message) -> Option<String> {
    if let Some(user) = msg.from.as_ref() {
        return Some(format!("tg://user?id={}", user.id.0));
    }
    msg.sender_chat
        .as_ref()
        .map(|chat| format!("tg://channel/{}", chat.id.0))
}

/// Builds an [`UpdateEvent`] from a message, or `None` if it carries no text.
pub fn to_update_event(msg: &Message) -> Option<UpdateEvent> {
    if !is_public_chat(msg) {
        return None;
    }
    let payload = msg.text().or_else(|| msg.caption())?;
    Some(UpdateEvent {
        channel_id: msg.chat.id.0,
        message_id: i64::from(msg.id.0),
        sender: sender_of(msg),
        payload: payload.to_string(),
        timestamp: msg.date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_post(text: serde_json::Value) -> Message {
        let mut json = serde_json::json!({
            "message_id": 42,
            "date": 1700000000i64,
            "chat": {
                "id": -1001234567890i64,
                "type": "channel",
                "title": "News",
            },
            "sender_chat": {
                "id": -1001234567890i64,
                "type": "channel",
                "title": "News",
            },
        });
        if let (Some(obj), Some(extra)) = (json.as_object_mut(), text.as_object()) {
            obj.extend(extra.clone());
        }
        serde_json::from_value(json).expect("failed to deserialize channel post")
    }

    fn group_message(user_id: u64, text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 7,
            "date": 1700000000i64,
            "chat": {
                "id": -100123i64,
                "type": "supergroup",
                "title": "Ops",
            },
            "from": {
                "id": user_id,
                "is_bot": false,
                "first_name": "Test",
            },
            "text": text,
        });
        serde_json::from_value(json).expect("failed to deserialize group message")
    }

    fn private_message(text: &str) -> Message {
        let json = serde_json::json!({
            "message_id": 1,
            "date": 1700000000i64,
            "chat": {
                "id": 12345i64,
                "type": "private",
                "first_name": "Test",
            },
            "from": {
                "id": 12345u64,
                "is_bot": false,
                "first_name": "Test",
            },
            "text": text,
        });
        serde_json::from_value(json).expect("failed to deserialize private message")
    }

    #[test]
    fn channel_post_maps_to_update() {
        let msg = channel_post(serde_json::json!({ "text": "breaking" }));
        let update = to_update_event(&msg).unwrap();
        assert_eq!(update.channel_id, -1001234567890);
        assert_eq!(update.message_id, 42);
        assert_eq!(update.payload, "breaking");
        assert_eq!(update.sender.as_deref(), Some("tg://channel/-1001234567890"));
        assert_eq!(update.timestamp.timestamp(), 1700000000);
    }

    #[test]
    fn caption_is_used_when_text_is_absent() {
        let msg = channel_post(serde_json::json!({
            "caption": "photo caption",
            "photo": [{
                "file_id": "f",
                "file_unique_id": "u",
                "width": 10,
                "height": 10,
            }],
        }));
        assert_eq!(to_update_event(&msg).unwrap().payload, "photo caption");
    }

    #[test]
    fn group_message_sender_is_user_uri() {
        let update = to_update_event(&group_message(555, "hi")).unwrap();
        assert_eq!(update.sender.as_deref(), Some("tg://user?id=555"));
        assert_eq!(update.channel_id, -100123);
    }

    #[test]
    fn private_messages_are_ignored() {
        let msg = private_message("hello");
        assert!(!is_public_chat(&msg));
        assert!(to_update_event(&msg).is_none());
    }

    #[test]
    fn messages_without_text_are_ignored() {
        let msg = channel_post(serde_json::json!({
            "photo": [{
                "file_id": "f",
                "file_unique_id": "u",
                "width": 10,
                "height": 10,
            }],
        }));
        assert!(to_update_event(&msg).is_none());
    }
}

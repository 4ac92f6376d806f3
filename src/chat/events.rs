use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::Message;

/// Inbound events, client to server. Disconnect is implicit: the socket
/// closing, not a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    #[serde(rename = "join_room")]
    Join {
        user_id: Uuid,
    },
    SendMessage {
        sender: Uuid,
        recipient: Uuid,
        content: String,
    },
    Typing {
        sender: Uuid,
        recipient: Uuid,
    },
    StopTyping {
        sender: Uuid,
        recipient: Uuid,
    },
    MarkRead {
        #[serde(rename = "senderId")]
        sender_id: Uuid,
        #[serde(rename = "recipientId")]
        recipient_id: Uuid,
    },
}

/// Outbound events, server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Complete list of online users, rebroadcast on every join/disconnect.
    OnlineUsers { users: Vec<Uuid> },
    ReceiveMessage { message: Message },
    DisplayTyping { sender: Uuid },
    HideTyping { sender: Uuid },
    /// Read receipt for the original sender: `reader_id` has seen their
    /// messages.
    MessagesReadUpdate {
        #[serde(rename = "readerId")]
        reader_id: Uuid,
    },
    /// A store call failed while handling this connection's event.
    SendFailed { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_tags_match_wire_names() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"send_message",
                "sender":"00000000-0000-7000-8000-000000000001",
                "recipient":"00000000-0000-7000-8000-000000000002",
                "content":"hi"}"#,
        )
        .unwrap();

        match event {
            ClientEvent::SendMessage { content, .. } => assert_eq!(content, "hi"),
            other => panic!("parsed as {other:?}"),
        }
    }

    #[test]
    fn outbound_tags_match_wire_names() {
        let json = serde_json::to_value(ServerEvent::MessagesReadUpdate {
            reader_id: Uuid::now_v7(),
        })
        .unwrap();

        assert_eq!(json["type"], "messages_read_update");
        assert!(json["readerId"].is_string());
    }

    // Wire names a client ported from the socket.io contract relies on:
    // the join event is "join_room" and the read-receipt keys are
    // camelCased.
    #[test]
    fn join_and_read_receipt_keep_original_wire_names() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"join_room",
                "user_id":"00000000-0000-7000-8000-000000000001"}"#,
        )
        .unwrap();
        assert!(matches!(event, ClientEvent::Join { .. }));

        let event: ClientEvent = serde_json::from_str(
            r#"{"type":"mark_read",
                "senderId":"00000000-0000-7000-8000-000000000001",
                "recipientId":"00000000-0000-7000-8000-000000000002"}"#,
        )
        .unwrap();
        assert!(matches!(event, ClientEvent::MarkRead { .. }));
    }
}

//! WebSocket message DTOs for the chat protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    domain::{ChatMessage, GroupId, MessageId, MessageKind, Recipient, Timestamp, UserId},
    infrastructure::error::DecodeError,
};

/// Envelope tag: single chat message (`message` slot)
pub const TAG_MESSAGE: &str = "message";
/// Envelope tag: human-readable server error (`error` slot)
pub const TAG_ERROR: &str = "error";
/// Envelope tag: presence list (`users` slot, or a single `user`)
pub const TAG_USERS: &str = "users";
/// Envelope tag: group created (`groupDTO` slot)
pub const TAG_GROUP: &str = "group";
/// Envelope tag: incoming friend request (`friendRequest` slot)
pub const TAG_FRIEND_REQUEST: &str = "friendRequest";
/// Envelope tag: acknowledgement of a request we sent (`friendRequest` slot)
pub const TAG_FRIEND_REQUEST_SENT: &str = "friendRequestSent";
/// Envelope tag: accept/reject outcome of a request (`friendRequest` slot)
pub const TAG_FRIEND_REQUEST_RESULT: &str = "friendRequestResult";

/// Outgoing frame type
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FrameType {
    Chat,
}

/// Chat message sent from the client to the server.
///
/// Absent optional fields are serialized as `null`: the server tells private
/// and group messages apart by testing `groupId` for null.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingChatFrame<'a> {
    pub r#type: FrameType,
    pub sender_id: UserId,
    pub sender_name: Option<&'a str>,
    pub content: &'a str,
    pub message_type: MessageKind,
    pub receiver_id: Option<UserId>,
    pub receiver_name: Option<&'a str>,
    pub group_id: Option<GroupId>,
    pub file_url: Option<&'a str>,
}

impl<'a> From<&'a ChatMessage> for OutgoingChatFrame<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            r#type: FrameType::Chat,
            sender_id: message.sender_id,
            sender_name: message.sender_name.as_deref(),
            content: &message.content,
            message_type: message.kind,
            receiver_id: message.receiver_id(),
            receiver_name: message.receiver_name(),
            group_id: message.group_id(),
            file_url: message.file_url.as_deref(),
        }
    }
}

/// Chat message as delivered by the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageDto {
    #[serde(default)]
    pub id: Option<MessageId>,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub content: Option<String>,
    pub sender_id: UserId,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub receiver_id: Option<UserId>,
    #[serde(default)]
    pub receiver_name: Option<String>,
    #[serde(default)]
    pub group_id: Option<GroupId>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub file_url: Option<String>,
}

impl TryFrom<ChatMessageDto> for ChatMessage {
    type Error = DecodeError;

    fn try_from(dto: ChatMessageDto) -> Result<Self, Self::Error> {
        let recipient = match (dto.receiver_id, dto.group_id) {
            (Some(_), Some(_)) => {
                return Err(DecodeError::AmbiguousRecipient {
                    sender_id: dto.sender_id.value(),
                });
            }
            (Some(id), None) => Recipient::User {
                id,
                name: dto.receiver_name,
            },
            (None, Some(group_id)) => Recipient::Group(group_id),
            (None, None) => Recipient::Unaddressed,
        };

        Ok(ChatMessage {
            id: dto.id,
            kind: dto.kind,
            content: dto.content.unwrap_or_default(),
            sender_id: dto.sender_id,
            sender_name: dto.sender_name,
            recipient,
            timestamp: dto.timestamp,
            file_url: dto.file_url,
        })
    }
}

/// Tagged envelope as delivered by the server.
///
/// Payload slots are kept as raw JSON; only the slot the tag selects is
/// decoded, so unrelated or foreign slots never fail the frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeDto {
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub users: Option<Value>,
    #[serde(default)]
    pub user: Option<Value>,
    #[serde(default, rename = "groupDTO")]
    pub group: Option<Value>,
    #[serde(default)]
    pub friend_request: Option<Value>,
}

/// Take a payload slot, treating JSON `null` as absent.
pub fn slot(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outgoing_frame_field_order_and_nulls() {
        // テスト項目: 送信フレームが固定の順序で、未設定フィールドを null として出力する
        // given (前提条件):
        let message = ChatMessage::private(UserId::new(1), UserId::new(2), MessageKind::Text, "hi");

        // when (操作):
        let json = serde_json::to_string(&OutgoingChatFrame::from(&message)).unwrap();

        // then (期待する結果):
        assert_eq!(
            json,
            r#"{"type":"CHAT","senderId":1,"senderName":null,"content":"hi","messageType":"TEXT","receiverId":2,"receiverName":null,"groupId":null,"fileUrl":null}"#
        );
    }

    #[test]
    fn test_chat_message_dto_rejects_both_recipients() {
        // テスト項目: receiverId と groupId の両方を持つメッセージは拒否される
        // given (前提条件):
        let json = r#"{"type":"TEXT","content":"x","senderId":1,"receiverId":2,"groupId":3}"#;
        let dto: ChatMessageDto = serde_json::from_str(json).unwrap();

        // when (操作):
        let result = ChatMessage::try_from(dto);

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(DecodeError::AmbiguousRecipient { sender_id: 1 })
        ));
    }

    #[test]
    fn test_chat_message_dto_minimal_fields() {
        // テスト項目: 必須フィールドのみのメッセージは宛先なしとしてデコードされる
        // given (前提条件):
        let json = r#"{"type":"TIME","content":"","senderId":0,"timestamp":null}"#;
        let dto: ChatMessageDto = serde_json::from_str(json).unwrap();

        // when (操作):
        let message = ChatMessage::try_from(dto).unwrap();

        // then (期待する結果):
        assert_eq!(message.recipient, Recipient::Unaddressed);
        assert!(message.is_divider());
        assert_eq!(message.timestamp, None);
    }

    #[test]
    fn test_chat_message_dto_requires_sender() {
        // テスト項目: senderId が欠けたメッセージはデコードエラーになる
        // given (前提条件):
        let json = r#"{"type":"TEXT","content":"x"}"#;

        // when (操作):
        let result = serde_json::from_str::<ChatMessageDto>(json);

        // then (期待する結果):
        assert!(result.is_err());
    }
}

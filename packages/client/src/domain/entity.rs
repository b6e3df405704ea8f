//! Core domain models for the chat transport.

use serde::{Deserialize, Serialize};

use super::value_object::{GroupId, MessageId, MessageKind, OnlineStatus, Timestamp, UserId};

/// Who a chat message is addressed to.
///
/// A message is private or group, never both. `Unaddressed` only appears on
/// inbound payloads such as `TIME` dividers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Private message to a single user
    User {
        id: UserId,
        /// Display name of the receiver, if the sender knows it
        name: Option<String>,
    },
    /// Message to every member of a group
    Group(GroupId),
    /// No recipient (synthetic or server-generated payloads)
    Unaddressed,
}

/// A single chat payload.
///
/// Created by the sender when composing and immutable once sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Server-assigned identifier (absent before the server stores it)
    pub id: Option<MessageId>,
    /// Payload kind
    pub kind: MessageKind,
    /// Text content, or a caption for media kinds
    pub content: String,
    /// Sender's user ID
    pub sender_id: UserId,
    /// Sender's display name
    pub sender_name: Option<String>,
    /// Private or group addressing
    pub recipient: Recipient,
    /// When the server stored the message
    pub timestamp: Option<Timestamp>,
    /// Location of the attachment for media kinds
    pub file_url: Option<String>,
}

impl ChatMessage {
    /// Compose a private message to `receiver_id`.
    pub fn private(
        sender_id: UserId,
        receiver_id: UserId,
        kind: MessageKind,
        content: impl Into<String>,
    ) -> Self {
        Self::composed(
            sender_id,
            Recipient::User {
                id: receiver_id,
                name: None,
            },
            kind,
            content.into(),
        )
    }

    /// Compose a message to every member of `group_id`.
    pub fn group(
        sender_id: UserId,
        group_id: GroupId,
        kind: MessageKind,
        content: impl Into<String>,
    ) -> Self {
        Self::composed(sender_id, Recipient::Group(group_id), kind, content.into())
    }

    fn composed(
        sender_id: UserId,
        recipient: Recipient,
        kind: MessageKind,
        content: String,
    ) -> Self {
        Self {
            id: None,
            kind,
            content,
            sender_id,
            sender_name: None,
            recipient,
            timestamp: None,
            file_url: None,
        }
    }

    /// Attach the sender's display name.
    pub fn with_sender_name(mut self, name: impl Into<String>) -> Self {
        self.sender_name = Some(name.into());
        self
    }

    /// Attach the receiver's display name. No effect on group messages.
    pub fn with_receiver_name(mut self, receiver_name: impl Into<String>) -> Self {
        if let Recipient::User { name, .. } = &mut self.recipient {
            *name = Some(receiver_name.into());
        }
        self
    }

    /// Attach an uploaded file.
    pub fn with_file_url(mut self, url: impl Into<String>) -> Self {
        self.file_url = Some(url.into());
        self
    }

    /// Receiver of a private message.
    pub fn receiver_id(&self) -> Option<UserId> {
        match &self.recipient {
            Recipient::User { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Receiver display name of a private message.
    pub fn receiver_name(&self) -> Option<&str> {
        match &self.recipient {
            Recipient::User { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Target group of a group message.
    pub fn group_id(&self) -> Option<GroupId> {
        match &self.recipient {
            Recipient::Group(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.recipient, Recipient::Group(_))
    }

    /// `TIME` messages are date dividers with no delivery semantics.
    pub fn is_divider(&self) -> bool {
        self.kind == MessageKind::Time
    }
}

/// A user's online status plus display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRecord {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default, alias = "avatar")]
    pub avatar_url: Option<String>,
    #[serde(default, alias = "onlineStatus")]
    pub status: OnlineStatus,
}

impl PresenceRecord {
    /// Nickname if set, otherwise the username.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.username)
    }
}

/// A friend request, passed through to listeners unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestRecord {
    pub id: i64,
    pub sender: PresenceRecord,
    pub receiver: PresenceRecord,
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// A newly created group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub member_ids: Vec<UserId>,
}

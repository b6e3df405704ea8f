//! Events surfaced by the transport, one variant per listener kind.

use std::fmt;

use super::entity::{ChatMessage, FriendRequestRecord, GroupRecord, PresenceRecord};

/// A decoded inbound event.
///
/// Every event belongs to exactly one [`ListenerKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Message(ChatMessage),
    PresenceList(Vec<PresenceRecord>),
    Error(String),
    FriendRequestReceived(FriendRequestRecord),
    FriendRequestSent(FriendRequestRecord),
    FriendRequestResult(FriendRequestRecord),
    GroupCreated(GroupRecord),
}

impl ChatEvent {
    /// The listener kind this event is delivered to.
    pub fn kind(&self) -> ListenerKind {
        match self {
            ChatEvent::Message(_) => ListenerKind::Message,
            ChatEvent::PresenceList(_) => ListenerKind::PresenceList,
            ChatEvent::Error(_) => ListenerKind::Error,
            ChatEvent::FriendRequestReceived(_) => ListenerKind::FriendRequestReceived,
            ChatEvent::FriendRequestSent(_) => ListenerKind::FriendRequestSent,
            ChatEvent::FriendRequestResult(_) => ListenerKind::FriendRequestResult,
            ChatEvent::GroupCreated(_) => ListenerKind::GroupCreated,
        }
    }
}

/// The seven independently managed listener categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Message,
    PresenceList,
    Error,
    FriendRequestReceived,
    FriendRequestSent,
    FriendRequestResult,
    GroupCreated,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 7] = [
        ListenerKind::Message,
        ListenerKind::PresenceList,
        ListenerKind::Error,
        ListenerKind::FriendRequestReceived,
        ListenerKind::FriendRequestSent,
        ListenerKind::FriendRequestResult,
        ListenerKind::GroupCreated,
    ];
}

impl fmt::Display for ListenerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ListenerKind::Message => "message",
            ListenerKind::PresenceList => "presence-list",
            ListenerKind::Error => "error",
            ListenerKind::FriendRequestReceived => "friend-request-received",
            ListenerKind::FriendRequestSent => "friend-request-sent",
            ListenerKind::FriendRequestResult => "friend-request-result",
            ListenerKind::GroupCreated => "group-created",
        };
        f.write_str(name)
    }
}

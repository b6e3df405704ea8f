//! Domain layer for the chat transport client.
//!
//! This module contains the chat payload types and the events the transport
//! surfaces. It is independent of the wire format (DTOs) and of the socket.

pub mod entity;
pub mod error;
pub mod event;
pub mod value_object;

pub use entity::{ChatMessage, FriendRequestRecord, GroupRecord, PresenceRecord, Recipient};
pub use error::ValueObjectError;
pub use event::{ChatEvent, ListenerKind};
pub use value_object::{
    GroupId, MessageId, MessageKind, OnlineStatus, ServerUrl, Timestamp, UserId,
};

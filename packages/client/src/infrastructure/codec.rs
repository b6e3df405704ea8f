//! Wire codec: outgoing chat frames and inbound frame decoding.
//!
//! Inbound frames come in two shapes:
//!
//! ```text
//! [ {ChatMessage}, {ChatMessage}, ... ]          legacy bulk delivery
//! { "type": "<tag>", "<slot>": <payload> }       tagged envelope
//! ```
//!
//! Decoding is pure; the caller decides what to do with a [`DecodeError`]
//! (the connection logs it and drops the frame).

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{ChatEvent, ChatMessage, FriendRequestRecord, GroupRecord, PresenceRecord};

use super::{
    dto::websocket::{
        ChatMessageDto, EnvelopeDto, OutgoingChatFrame, TAG_ERROR, TAG_FRIEND_REQUEST,
        TAG_FRIEND_REQUEST_RESULT, TAG_FRIEND_REQUEST_SENT, TAG_GROUP, TAG_MESSAGE, TAG_USERS,
        slot,
    },
    error::DecodeError,
};

/// A decoded tagged envelope. Exactly one payload per variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Message(ChatMessage),
    /// `message` tag carrying a `messages` list instead of a single message
    Messages(Vec<ChatMessage>),
    Error(String),
    Users(Vec<PresenceRecord>),
    Group(GroupRecord),
    FriendRequest(FriendRequestRecord),
    FriendRequestSent(FriendRequestRecord),
    FriendRequestResult(FriendRequestRecord),
    /// Tag this client does not understand; no listener is notified
    Unknown { tag: String },
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// Bare JSON array of messages
    Bulk(Vec<ChatMessage>),
    Envelope(Envelope),
}

impl Envelope {
    /// Events carried by this envelope, in delivery order.
    pub fn into_events(self) -> Vec<ChatEvent> {
        match self {
            Envelope::Message(message) => vec![ChatEvent::Message(message)],
            Envelope::Messages(messages) => messages.into_iter().map(ChatEvent::Message).collect(),
            Envelope::Error(error) => vec![ChatEvent::Error(error)],
            Envelope::Users(users) => vec![ChatEvent::PresenceList(users)],
            Envelope::Group(group) => vec![ChatEvent::GroupCreated(group)],
            Envelope::FriendRequest(request) => vec![ChatEvent::FriendRequestReceived(request)],
            Envelope::FriendRequestSent(request) => vec![ChatEvent::FriendRequestSent(request)],
            Envelope::FriendRequestResult(request) => vec![ChatEvent::FriendRequestResult(request)],
            Envelope::Unknown { .. } => Vec::new(),
        }
    }
}

impl InboundFrame {
    /// Events to dispatch, in delivery order. Unknown envelopes yield none.
    pub fn into_events(self) -> Vec<ChatEvent> {
        match self {
            InboundFrame::Bulk(messages) => messages.into_iter().map(ChatEvent::Message).collect(),
            InboundFrame::Envelope(envelope) => envelope.into_events(),
        }
    }
}

/// Encode a chat message as an outgoing `CHAT` frame.
pub fn encode(message: &ChatMessage) -> Result<String, serde_json::Error> {
    serde_json::to_string(&OutgoingChatFrame::from(message))
}

/// Decode an inbound text frame.
pub fn decode(frame: &str) -> Result<InboundFrame, DecodeError> {
    let value: Value = serde_json::from_str(frame)?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(decode_message)
            .collect::<Result<Vec<_>, _>>()
            .map(InboundFrame::Bulk),
        Value::Object(_) => {
            decode_envelope(serde_json::from_value(value)?).map(InboundFrame::Envelope)
        }
        Value::Null => Err(DecodeError::UnexpectedShape("null")),
        Value::Bool(_) => Err(DecodeError::UnexpectedShape("boolean")),
        Value::Number(_) => Err(DecodeError::UnexpectedShape("number")),
        Value::String(_) => Err(DecodeError::UnexpectedShape("string")),
    }
}

fn decode_message(value: Value) -> Result<ChatMessage, DecodeError> {
    let dto: ChatMessageDto = serde_json::from_value(value)?;
    ChatMessage::try_from(dto)
}

fn decode_envelope(dto: EnvelopeDto) -> Result<Envelope, DecodeError> {
    let envelope = match dto.tag.as_str() {
        TAG_MESSAGE => match (slot(dto.message), slot(dto.messages)) {
            (Some(message), _) => Envelope::Message(decode_message(message)?),
            (None, Some(Value::Array(items))) => Envelope::Messages(
                items
                    .into_iter()
                    .map(decode_message)
                    .collect::<Result<_, _>>()?,
            ),
            (None, _) => return Err(missing(TAG_MESSAGE, "message")),
        },
        TAG_ERROR => Envelope::Error(required(TAG_ERROR, "error", dto.error)?),
        TAG_USERS => match (slot(dto.users), slot(dto.user)) {
            (Some(users), _) => Envelope::Users(serde_json::from_value(users)?),
            (None, Some(user)) => Envelope::Users(vec![serde_json::from_value(user)?]),
            (None, None) => return Err(missing(TAG_USERS, "users")),
        },
        TAG_GROUP => Envelope::Group(required(TAG_GROUP, "groupDTO", dto.group)?),
        TAG_FRIEND_REQUEST => Envelope::FriendRequest(required(
            TAG_FRIEND_REQUEST,
            "friendRequest",
            dto.friend_request,
        )?),
        TAG_FRIEND_REQUEST_SENT => Envelope::FriendRequestSent(required(
            TAG_FRIEND_REQUEST_SENT,
            "friendRequest",
            dto.friend_request,
        )?),
        TAG_FRIEND_REQUEST_RESULT => Envelope::FriendRequestResult(required(
            TAG_FRIEND_REQUEST_RESULT,
            "friendRequest",
            dto.friend_request,
        )?),
        _ => Envelope::Unknown { tag: dto.tag },
    };
    Ok(envelope)
}

fn required<T: DeserializeOwned>(
    tag: &'static str,
    name: &'static str,
    value: Option<Value>,
) -> Result<T, DecodeError> {
    let value = slot(value).ok_or_else(|| missing(tag, name))?;
    Ok(serde_json::from_value(value)?)
}

fn missing(tag: &'static str, slot: &'static str) -> DecodeError {
    DecodeError::MissingPayload { tag, slot }
}

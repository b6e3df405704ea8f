//! Infrastructure layer error definitions.

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors raised while decoding an inbound frame.
///
/// A decode error never tears the connection down; the frame is dropped.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Frame is not valid JSON or a payload does not match its schema
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// Frame is valid JSON but neither an array nor an object
    #[error("frame must be a JSON array or object (got {0})")]
    UnexpectedShape(&'static str),

    /// Recognized tag without the payload slot it requires
    #[error("envelope '{tag}' is missing its '{slot}' payload")]
    MissingPayload {
        tag: &'static str,
        slot: &'static str,
    },

    /// Message sets both `receiverId` and `groupId`
    #[error("message {sender_id}: receiverId and groupId are mutually exclusive")]
    AmbiguousRecipient { sender_id: i64 },
}

/// Errors raised by a transport connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Opening handshake failed (DNS, TCP, TLS or HTTP upgrade)
    #[error("WebSocket handshake failed: {0}")]
    Handshake(#[source] tungstenite::Error),

    /// Writing a frame failed
    #[error("WebSocket write failed: {0}")]
    Write(#[source] tungstenite::Error),

    /// Reading a frame failed
    #[error("WebSocket read failed: {0}")]
    Read(#[source] tungstenite::Error),

    /// Connection refused without a protocol-level error
    #[error("connection refused: {0}")]
    Refused(String),

    /// Connection went away without a close frame
    #[error("connection lost: {0}")]
    Closed(String),
}

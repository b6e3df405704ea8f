//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ServerUrl validation error
    #[error("ServerUrl cannot be empty")]
    ServerUrlEmpty,

    /// ServerUrl scheme is neither HTTP(S) nor WS(S)
    #[error("ServerUrl scheme must be one of http, https, ws, wss (got: {0})")]
    ServerUrlUnsupportedScheme(String),

    /// ServerUrl has a scheme but nothing after it
    #[error("ServerUrl must contain a host (got: {0})")]
    ServerUrlMissingHost(String),

    /// OnlineStatus code outside the known range
    #[error("OnlineStatus code must be 0, 1 or 2 (got {0})")]
    OnlineStatusUnknown(u8),

    /// Timestamp text is not an ISO-8601 local date-time
    #[error("Timestamp must be an ISO-8601 local date-time (got: {0})")]
    TimestampInvalidText(String),

    /// Timestamp array does not have exactly seven elements
    #[error("Timestamp array must have {expected} elements (got {actual})")]
    TimestampInvalidLength { expected: usize, actual: usize },

    /// Timestamp array elements do not form a valid date-time
    #[error("Timestamp components do not form a valid date-time: {0:?}")]
    TimestampOutOfRange(Vec<i64>),
}

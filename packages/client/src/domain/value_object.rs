//! Value Objects for domain models.
//!
//! Value Objects are immutable objects that represent values in the domain.
//! They are compared by their value, not by identity.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::ValueObjectError;

/// User identifier value object.
///
/// Numeric identifier assigned by the chat server to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Create a new UserId.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Group identifier value object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(i64);

impl GroupId {
    /// Create a new GroupId.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message identifier value object.
///
/// Only present once the server has stored the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    /// Create a new MessageId.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the inner i64 value.
    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Kind of a chat payload.
///
/// `Time` is a synthetic date divider; it is never delivered to anybody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    Text,
    Image,
    File,
    Video,
    Audio,
    Time,
}

impl MessageKind {
    /// Wire name of the kind (`"TEXT"`, `"IMAGE"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "TEXT",
            MessageKind::Image => "IMAGE",
            MessageKind::File => "FILE",
            MessageKind::Video => "VIDEO",
            MessageKind::Audio => "AUDIO",
            MessageKind::Time => "TIME",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Online status of a user, transmitted as its integer code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OnlineStatus {
    #[default]
    Offline,
    Online,
    Busy,
}

impl TryFrom<u8> for OnlineStatus {
    type Error = ValueObjectError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(OnlineStatus::Offline),
            1 => Ok(OnlineStatus::Online),
            2 => Ok(OnlineStatus::Busy),
            other => Err(ValueObjectError::OnlineStatusUnknown(other)),
        }
    }
}

impl From<OnlineStatus> for u8 {
    fn from(status: OnlineStatus) -> Self {
        match status {
            OnlineStatus::Offline => 0,
            OnlineStatus::Online => 1,
            OnlineStatus::Busy => 2,
        }
    }
}

impl fmt::Display for OnlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OnlineStatus::Offline => "offline",
            OnlineStatus::Online => "online",
            OnlineStatus::Busy => "busy",
        };
        f.write_str(label)
    }
}

/// Timestamp value object.
///
/// A local date-time with nanosecond precision. On the wire it is either an
/// ISO-8601 string (`"2024-01-02T03:04:05.000000006"`) or a seven element
/// array `[year, month, day, hour, minute, second, nanosecond]`; both decode
/// to the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(NaiveDateTime);

/// Number of elements in the array form of a timestamp.
const TIMESTAMP_PARTS: usize = 7;

impl Timestamp {
    /// Create a new Timestamp.
    pub fn new(value: NaiveDateTime) -> Self {
        Self(value)
    }

    /// Get the inner date-time value.
    pub fn value(&self) -> NaiveDateTime {
        self.0
    }

    /// Parse the ISO-8601 string form.
    ///
    /// Seconds and the fractional part may be omitted, as servers drop
    /// trailing zero fields when printing local date-times.
    pub fn parse(text: &str) -> Result<Self, ValueObjectError> {
        NaiveDateTime::from_str(text)
            .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
            .map(Self)
            .map_err(|_| ValueObjectError::TimestampInvalidText(text.to_string()))
    }

    /// Build from the array form. The seventh element is in nanoseconds.
    pub fn from_parts(parts: &[i64]) -> Result<Self, ValueObjectError> {
        if parts.len() != TIMESTAMP_PARTS {
            return Err(ValueObjectError::TimestampInvalidLength {
                expected: TIMESTAMP_PARTS,
                actual: parts.len(),
            });
        }

        let out_of_range = || ValueObjectError::TimestampOutOfRange(parts.to_vec());
        let year = i32::try_from(parts[0]).map_err(|_| out_of_range())?;
        let [month, day, hour, minute, second, nano] = [
            parts[1], parts[2], parts[3], parts[4], parts[5], parts[6],
        ]
        .map(|part| u32::try_from(part).ok());

        let date = NaiveDate::from_ymd_opt(
            year,
            month.ok_or_else(out_of_range)?,
            day.ok_or_else(out_of_range)?,
        )
        .ok_or_else(out_of_range)?;
        date.and_hms_nano_opt(
            hour.ok_or_else(out_of_range)?,
            minute.ok_or_else(out_of_range)?,
            second.ok_or_else(out_of_range)?,
            nano.ok_or_else(out_of_range)?,
        )
        .map(Self)
        .ok_or_else(out_of_range)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S%.f"))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepted wire shapes of a timestamp.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Text(String),
    Parts(Vec<i64>),
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parsed = match RawTimestamp::deserialize(deserializer)? {
            RawTimestamp::Text(text) => Timestamp::parse(&text),
            RawTimestamp::Parts(parts) => Timestamp::from_parts(&parts),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

/// Chat server URL value object.
///
/// Always holds a WebSocket URL: `http://` is normalized to `ws://` and
/// `https://` to `wss://`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerUrl(String);

impl ServerUrl {
    /// Create a new ServerUrl, normalizing the scheme to its socket variant.
    pub fn new(url: impl Into<String>) -> Result<Self, ValueObjectError> {
        let url = url.into();
        let url = url.trim();
        if url.is_empty() {
            return Err(ValueObjectError::ServerUrlEmpty);
        }

        let (scheme, rest) = url
            .split_once("://")
            .ok_or_else(|| ValueObjectError::ServerUrlUnsupportedScheme(url.to_string()))?;
        let ws_scheme = match scheme.to_ascii_lowercase().as_str() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            _ => {
                return Err(ValueObjectError::ServerUrlUnsupportedScheme(
                    scheme.to_string(),
                ));
            }
        };
        if rest.is_empty() || rest.starts_with('/') || rest.starts_with('?') {
            return Err(ValueObjectError::ServerUrlMissingHost(url.to_string()));
        }

        Ok(Self(format!("{ws_scheme}://{rest}")))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URL to open for `user_id`, carrying it as the `userId` query parameter.
    pub fn connect_url(&self, user_id: UserId) -> String {
        let separator = if self.0.contains('?') { '&' } else { '?' };
        format!("{}{}userId={}", self.0, separator, user_id)
    }
}

impl fmt::Display for ServerUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

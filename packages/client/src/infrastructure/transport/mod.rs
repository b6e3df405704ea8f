//! Socket transport seam.
//!
//! The supervisor only talks to a [`Connector`], which hands back a
//! ([`FrameWriter`], [`FrameReader`]) pair for one connection. Production code
//! uses [`TungsteniteConnector`]; tests plug in `MemoryConnector` (available
//! with the `test-util` feature) or a mock.

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod tungstenite;

use async_trait::async_trait;

use super::error::TransportError;

#[cfg(any(test, feature = "test-util"))]
pub use memory::{ConnectAttempt, MemoryConnector, MemoryPeer};
pub use tungstenite::TungsteniteConnector;

/// WebSocket close code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

/// A frame relevant to the chat protocol.
///
/// Binary and control frames other than close are handled (or ignored) by
/// the transport itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Close { code: u16, reason: String },
}

/// Write half of a connection.
#[async_trait]
pub trait FrameWriter: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Send a close frame with `code` and `reason`.
    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError>;
}

/// Read half of a connection.
#[async_trait]
pub trait FrameReader: Send {
    /// Next frame, or `None` once the stream has ended.
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>>;
}

/// Both halves of an opened connection.
pub struct TransportPair {
    pub writer: Box<dyn FrameWriter>,
    pub reader: Box<dyn FrameReader>,
}

impl std::fmt::Debug for TransportPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportPair").finish_non_exhaustive()
    }
}

/// Opens transport connections.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync {
    /// Perform the opening handshake against `url`.
    async fn connect(&self, url: &str) -> Result<TransportPair, TransportError>;
}

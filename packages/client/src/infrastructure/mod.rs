//! Infrastructure layer: wire format and socket transport.

pub mod codec;
pub mod dto;
pub mod error;
pub mod transport;

pub use codec::{Envelope, InboundFrame, decode, encode};
pub use error::{DecodeError, TransportError};

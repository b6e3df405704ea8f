//! Connection supervisor: session lifecycle, reconnect policy and state.

pub mod connection;
pub mod policy;
pub mod state;

pub use connection::ChatConnection;
pub use policy::{DEFAULT_RECONNECT_DELAY, ReconnectPolicy};
pub use state::ConnectionState;

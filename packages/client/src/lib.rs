//! Real-time transport client for Chatwire chat servers.
//!
//! A [`ChatConnection`] keeps one supervised WebSocket session open, decodes
//! inbound frames into typed events and invokes the listeners registered for
//! each event kind on a dedicated callback thread.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod listener;
pub mod supervisor;
pub mod ui;

// Re-export entry points
pub use config::ClientConfig;
pub use error::{ClientError, ConfigError};
pub use listener::{Listener, Listeners};
pub use supervisor::{ChatConnection, ConnectionState, ReconnectPolicy};
pub use ui::run_client;

//! Client-level error definitions.

use rustyline::error::ReadlineError;
use thiserror::Error;

use crate::domain::ValueObjectError;

/// Errors raised while turning CLI arguments into a [`crate::config::ClientConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid server URL: {0}")]
    ServerUrl(#[from] ValueObjectError),

    #[error("--to-user and --to-group cannot be used together")]
    ConflictingRecipient,

    #[error("--reconnect-delay-secs must be greater than 0 (use --no-reconnect to disable)")]
    ZeroReconnectDelay,
}

/// Errors raised while setting up or running a chat session.
///
/// Connection failures are not here: they are reported to error listeners
/// and handled by the reconnect policy.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The callback thread could not be started
    #[error("failed to start callback executor: {0}")]
    Executor(#[source] std::io::Error),

    /// Created outside a Tokio runtime
    #[error("ChatConnection must be created inside a Tokio runtime")]
    NoRuntime,

    #[error("readline error: {0}")]
    Readline(#[from] ReadlineError),
}

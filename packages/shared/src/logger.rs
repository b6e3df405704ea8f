//! Logger bootstrap for Chatwire binaries.

use tracing_subscriber::EnvFilter;

/// Build the default filter directive for a binary.
///
/// Binary names use hyphens while tracing targets use the crate path, so
/// `chatwire-client` is rewritten to `chatwire_client`.
pub fn default_directive(app_name: &str, default_level: &str) -> String {
    let target = app_name.replace('-', "_");
    let level = default_level;
    format!("{target}={level},chatwire_client={level},chatwire_shared={level}")
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `default_level` when it is set.
/// Calling this twice is harmless; the second call only logs a warning.
pub fn setup_logger(app_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(app_name, default_level)));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
    {
        tracing::warn!("Logger already initialized: {}", e);
    }
}

//! Interactive chat client.
//!
//! Connects to a chat server, prints every event it receives and sends each
//! typed line to the configured recipient.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin chatwire -- --user-id 1 --to-user 2
//! ```

use clap::Parser;

use chatwire_client::{ClientConfig, config::CliArgs, run_client};
use chatwire_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = match ClientConfig::try_from(args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run_client(config).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}

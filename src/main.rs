//! Charity Media Server - Entry Point
//!
//! Loads configuration, initializes logging, and starts the public and
//! admin listeners.

use charity_media_server::{config::Config, logging::init_logging, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default()?;

    init_logging(&config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Charity Media Server"
    );

    run(config).await
}

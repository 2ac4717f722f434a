//! Copy uploads out of historical directories into the canonical one.
//!
//! Reads `storage.legacy_dirs` from the same configuration as the server.
//! Files already present in the canonical directory are never overwritten.
//!
//! ```bash
//! cargo run --bin migrate-uploads
//! ```

use charity_media_server::{
    config::Config,
    logging::init_logging,
    services::{migrate_uploads, StorageService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load_default()?;

    init_logging(&config.logging)?;

    let storage = StorageService::new(&config.storage).await?;

    tracing::info!(
        canonical = %storage.uploads_dir().display(),
        candidates = config.storage.legacy_dirs.len(),
        "Starting upload migration"
    );

    let report = migrate_uploads(&storage, &config.storage.legacy_dirs).await?;

    if !report.failed.is_empty() {
        anyhow::bail!("{} file(s) could not be migrated", report.failed.len());
    }

    Ok(())
}

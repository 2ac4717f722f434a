//! One-off migration of uploads from historical directories.
//!
//! Earlier deployments wrote uploads to directories the static server never
//! served. This copies every file found there into the canonical directory
//! unless a file of the same name is already present. Existing canonical
//! files are never overwritten; sources are left in place.

use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::services::storage::StorageService;

/// Outcome of a migration run
#[derive(Debug, Default, Clone, Serialize)]
pub struct MigrationReport {
    /// Candidate directories that existed and were scanned
    pub scanned_dirs: Vec<PathBuf>,
    /// Files copied into the canonical directory
    pub copied: Vec<String>,
    /// Files skipped because the canonical directory already had the name
    pub skipped: Vec<String>,
    /// Files that failed to copy
    pub failed: Vec<String>,
}

/// Copy uploads from `candidates` into the canonical directory
pub async fn migrate_uploads(
    storage: &StorageService,
    candidates: &[PathBuf],
) -> Result<MigrationReport> {
    storage.ensure_dir().await?;

    let canonical = canonicalize_or_keep(storage.uploads_dir()).await;
    let mut report = MigrationReport::default();

    for candidate in candidates {
        if canonicalize_or_keep(candidate).await == canonical {
            debug!(path = %candidate.display(), "Skipping canonical directory");
            continue;
        }

        let mut entries = match fs::read_dir(candidate).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %candidate.display(), "Candidate directory does not exist");
                continue;
            }
            Err(e) => {
                warn!(path = %candidate.display(), error = %e, "Cannot read candidate directory");
                continue;
            }
        };

        report.scanned_dirs.push(candidate.clone());

        while let Some(entry) = entries.next_entry().await? {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(dest) = storage.upload_path(&name) else {
                warn!(name = %name, "Skipping file with unusable name");
                report.failed.push(name);
                continue;
            };

            match copy_if_absent(&entry.path(), &dest).await {
                Ok(true) => {
                    info!(file = %name, from = %candidate.display(), "Copied upload");
                    report.copied.push(name);
                }
                Ok(false) => {
                    debug!(file = %name, "Already present in canonical directory");
                    report.skipped.push(name);
                }
                Err(e) => {
                    warn!(file = %name, error = %e, "Failed to copy upload");
                    report.failed.push(name);
                }
            }
        }
    }

    info!(
        scanned = report.scanned_dirs.len(),
        copied = report.copied.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Upload migration finished"
    );

    Ok(report)
}

/// Copy `src` to `dest` unless `dest` exists. Returns whether it copied.
async fn copy_if_absent(src: &Path, dest: &Path) -> std::io::Result<bool> {
    let mut target = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(e),
    };

    let copied = async {
        let mut source = File::open(src).await?;
        tokio::io::copy(&mut source, &mut target).await?;
        target.sync_all().await
    }
    .await;

    if let Err(e) = copied {
        if let Err(cleanup) = fs::remove_file(dest).await {
            warn!(path = %dest.display(), error = %cleanup, "Failed to remove incomplete copy");
        }
        return Err(e);
    }

    Ok(true)
}

async fn canonicalize_or_keep(path: &Path) -> PathBuf {
    fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

//! Storage service for the canonical upload directory.
//!
//! All uploads are written to, and served from, exactly one directory:
//!
//! ```text
//! public/
//! ├── images/              # static assets, sentinel defaults
//! │   └── default-project.jpg
//! └── uploads/             # canonical upload directory (flat)
//!     ├── image-1718000000000-123456789.jpg
//!     └── image-1718000000456-987654321.mp4
//! ```
//!
//! The path is resolved once from configuration and handed to every
//! component at construction. There is no manifest; the directory listing
//! is the index.

use crate::config::StorageConfig;
use crate::error::{AppError, Result};
use crate::models::UploadEntry;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Service owning the canonical upload directory
#[derive(Debug, Clone)]
pub struct StorageService {
    /// Absolute path of the canonical upload directory
    uploads_dir: PathBuf,
    /// Absolute path of the static images directory
    images_dir: PathBuf,
}

impl StorageService {
    /// Create a new storage service and ensure the upload directory exists
    ///
    /// # Errors
    /// Returns `StorageUnavailable` if the directory cannot be created.
    /// Callers on the write path treat this as fatal.
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        let service = Self::at(config.uploads_path(), config.images_path())?;

        service.ensure_dir().await?;

        info!(
            uploads = %service.uploads_dir.display(),
            images = %service.images_dir.display(),
            "Storage service initialized"
        );

        Ok(service)
    }

    /// Build a service for explicit directories without touching the disk
    pub fn at(uploads_dir: PathBuf, images_dir: PathBuf) -> Result<Self> {
        if uploads_dir.is_relative() {
            return Err(AppError::config(format!(
                "upload directory must be absolute: {}",
                uploads_dir.display()
            )));
        }

        Ok(Self {
            uploads_dir,
            images_dir,
        })
    }

    /// Canonical upload directory
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Static images directory
    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    /// Make sure the canonical directory exists.
    ///
    /// Idempotent: safe to call from startup, readiness checks and the
    /// migration binary, concurrently or in sequence.
    pub async fn ensure_dir(&self) -> Result<()> {
        let dir = &self.uploads_dir;

        if !fs::try_exists(dir).await.unwrap_or(false) {
            match fs::create_dir_all(dir).await {
                Ok(()) => info!(path = %dir.display(), "Created upload directory"),
                // Lost a race with another caller
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(AppError::storage_unavailable(format!(
                        "cannot create {}: {}",
                        dir.display(),
                        e
                    )))
                }
            }
        }

        let metadata = fs::metadata(dir).await.map_err(|e| {
            AppError::storage_unavailable(format!("cannot stat {}: {}", dir.display(), e))
        })?;

        if !metadata.is_dir() {
            return Err(AppError::storage_unavailable(format!(
                "{} exists but is not a directory",
                dir.display()
            )));
        }

        Ok(())
    }

    /// Map a stored filename to its path in the canonical directory.
    ///
    /// Returns `None` for anything that is not a single plain filename.
    pub fn upload_path(&self, name: &str) -> Option<PathBuf> {
        safe_file_name(name).map(|n| self.uploads_dir.join(n))
    }

    /// Map a static image name to its path in the images directory
    pub fn image_path(&self, name: &str) -> Option<PathBuf> {
        safe_file_name(name).map(|n| self.images_dir.join(n))
    }

    /// Remove a stored file, ignoring files that are already gone
    pub async fn remove_upload(&self, name: &str) -> Result<()> {
        let Some(path) = self.upload_path(name) else {
            return Err(AppError::validation(format!("Invalid filename: {}", name)));
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed upload");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// List the canonical directory, sorted by filename
    pub async fn list_uploads(&self) -> Result<Vec<UploadEntry>> {
        let mut uploads = Vec::new();
        let mut entries = fs::read_dir(&self.uploads_dir).await.map_err(|e| {
            AppError::storage_unavailable(format!(
                "cannot read {}: {}",
                self.uploads_dir.display(),
                e
            ))
        })?;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            uploads.push(UploadEntry {
                filename: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        uploads.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(uploads)
    }

    /// Get storage statistics
    pub async fn get_stats(&self) -> Result<StorageStats> {
        let uploads = self.list_uploads().await?;

        Ok(StorageStats {
            uploads_count: uploads.len(),
            uploads_size: uploads.iter().map(|u| u.size).sum(),
        })
    }
}

/// Storage statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct StorageStats {
    /// Number of files in the upload directory
    pub uploads_count: usize,
    /// Total size of the upload directory in bytes
    pub uploads_size: u64,
}

/// Accept only a single normal path component
pub fn safe_file_name(name: &str) -> Option<&str> {
    if name.is_empty() || name.contains('\\') || name.contains('\0') {
        return None;
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains('/') => Some(name),
        _ => None,
    }
}

//! Service layer for the charity media server.
//!
//! This module contains the upload-and-media-resolution core:
//! - Storage filename generation
//! - The canonical upload directory
//! - The upload gate (validation and streaming to disk)
//! - Resolution of requested media and placeholder synthesis
//! - One-off migration from historical upload directories

pub mod media_resolver;
pub mod migration;
pub mod naming;
pub mod placeholder;
pub mod storage;
pub mod upload_gate;

pub use media_resolver::{MediaResolver, Resolution};
pub use migration::{migrate_uploads, MigrationReport};
pub use storage::{StorageService, StorageStats};
pub use upload_gate::UploadGate;

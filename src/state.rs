//! Application state management.
//!
//! This module defines the shared application state that is accessible
//! from all request handlers via Axum's State extractor.
//!
//! The canonical upload directory is resolved once here and the same
//! `StorageService` is handed to both the upload gate (write path) and the
//! media resolver (read path).

use crate::config::Config;
use crate::error::Result;
use crate::services::{MediaResolver, StorageService, UploadGate};
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Canonical upload directory
    pub storage: Arc<StorageService>,

    /// Upload gate for the write path
    pub gate: Arc<UploadGate>,

    /// Media resolver for the read path
    pub resolver: MediaResolver,
}

impl AppState {
    /// Create a new application state
    ///
    /// # Errors
    /// Returns error if the upload directory cannot be created; the server
    /// must not start without it.
    pub async fn new(config: Config) -> Result<Self> {
        let storage = Arc::new(StorageService::new(&config.storage).await?);
        let gate = UploadGate::new(storage.clone(), config.upload.clone());
        let resolver = MediaResolver::new(storage.clone());

        Ok(Self {
            config: Arc::new(config),
            storage,
            gate: Arc::new(gate),
            resolver,
        })
    }

    /// Get cache max age in seconds
    pub fn cache_max_age(&self) -> u64 {
        self.config.server.cache_max_age
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &"<Config>")
            .field("storage", &self.storage.uploads_dir())
            .field("gate", &"<UploadGate>")
            .field("resolver", &"<MediaResolver>")
            .finish()
    }
}

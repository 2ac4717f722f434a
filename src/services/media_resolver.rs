//! Resolution of `/uploads/<name>` requests.
//!
//! ```text
//!                 Requested
//!                     │
//!        valid name and file exists? ──yes──► Served   (200, stream file)
//!                     │ no
//!   favicon/logo style browser request? ──yes──► Deferred (next handler)
//!                     │ no
//!                     ▼
//!                 Fallback (302 → /images/default-project.jpg)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use crate::models::DEFAULT_PROJECT_IMAGE;
use crate::services::storage::StorageService;

/// Name prefixes browsers request on their own
const BROWSER_ASSET_PREFIXES: &[&str] = &["favicon", "apple-touch-icon", "logo"];

/// Terminal state of a media request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// File found in the canonical directory
    Served(PathBuf),
    /// Not ours to answer; hand the request to the next handler
    Deferred,
    /// Redirect to the default asset
    Fallback(String),
}

/// Maps requested upload names onto the canonical directory
#[derive(Debug, Clone)]
pub struct MediaResolver {
    storage: Arc<StorageService>,
    fallback_path: String,
}

impl MediaResolver {
    pub fn new(storage: Arc<StorageService>) -> Self {
        Self {
            storage,
            fallback_path: default_asset_path(),
        }
    }

    /// Run the state machine for one requested name
    pub async fn resolve(&self, name: &str) -> Resolution {
        if let Some(path) = self.storage.upload_path(name) {
            let exists = tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if exists {
                return Resolution::Served(path);
            }
        }

        if is_browser_asset(name) {
            return Resolution::Deferred;
        }

        Resolution::Fallback(self.fallback_path.clone())
    }
}

/// Path the fallback redirect points at
pub fn default_asset_path() -> String {
    format!("/images/{}", DEFAULT_PROJECT_IMAGE)
}

/// Check for names browsers fetch without being asked
pub fn is_browser_asset(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    BROWSER_ASSET_PREFIXES.iter().any(|p| lower.starts_with(p))
}

//! Configuration module for the charity media server.
//!
//! This module handles loading and validating configuration from TOML files.
//!
//! # Configuration Sources (in order of priority)
//! 1. `config.local.toml` - Local overrides (gitignored)
//! 2. `config.toml` - Main configuration file
//!
//! Relative storage paths are anchored to the directory holding the loaded
//! file, so the canonical upload directory never depends on the working
//! directory of the process.
//!
//! # Example
//! ```rust,ignore
//! let config = Config::load("config.toml")?;
//! println!("Uploads live in {}", config.storage.uploads_path().display());
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 5 MiB
pub const DEFAULT_IMAGE_MAX_SIZE: u64 = 5 * 1024 * 1024;
/// 50 MiB
pub const DEFAULT_VIDEO_MAX_SIZE: u64 = 50 * 1024 * 1024;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind the public site listener to
    pub host: String,
    /// Port for the public site listener
    pub port: u16,
    /// Host to bind the admin listener to (should be localhost)
    pub admin_host: String,
    /// Port for the admin listener
    pub admin_port: u16,
    /// Cache-Control max-age in seconds for served uploads
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age: u64,
}

fn default_cache_max_age() -> u64 {
    3600
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root of the public static tree (`public/`)
    pub public_root: PathBuf,
    /// Canonical upload directory, relative to `public_root`
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
    /// Static images directory holding the sentinel defaults, relative to `public_root`
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    /// Directories earlier deployments wrote uploads to.
    /// Only read by the migration binary, never served from.
    #[serde(default)]
    pub legacy_dirs: Vec<PathBuf>,
}

fn default_uploads_dir() -> String {
    "uploads".to_string()
}

fn default_images_dir() -> String {
    "images".to_string()
}

impl StorageConfig {
    /// Get the full path to the canonical upload directory
    pub fn uploads_path(&self) -> PathBuf {
        self.public_root.join(&self.uploads_dir)
    }

    /// Get the full path to the static images directory
    pub fn images_path(&self) -> PathBuf {
        self.public_root.join(&self.images_dir)
    }

    /// Make relative paths absolute against `base`
    pub fn anchor(&mut self, base: &Path) {
        if self.public_root.is_relative() {
            self.public_root = base.join(&self.public_root);
        }
        for dir in &mut self.legacy_dirs {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}

/// Upload configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum size for image-only fields (bytes)
    #[serde(default = "default_image_max_size")]
    pub image_max_size: u64,
    /// Maximum size for video and mixed fields (bytes)
    #[serde(default = "default_video_max_size")]
    pub video_max_size: u64,
}

fn default_image_max_size() -> u64 {
    DEFAULT_IMAGE_MAX_SIZE
}

fn default_video_max_size() -> u64 {
    DEFAULT_VIDEO_MAX_SIZE
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            image_max_size: DEFAULT_IMAGE_MAX_SIZE,
            video_max_size: DEFAULT_VIDEO_MAX_SIZE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Config {
    /// Load configuration from a file path
    ///
    /// # Arguments
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed or validated
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = std::path::absolute(path.as_ref())?;
        let contents = std::fs::read_to_string(&path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Some(base) = path.parent() {
            config.storage.anchor(base);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Tries to load from:
    /// 1. `config.local.toml` (if exists)
    /// 2. `config.toml`
    ///
    /// # Errors
    /// Returns `ConfigError` if no configuration file is found
    pub fn load_default() -> Result<Self, ConfigError> {
        if Path::new("config.local.toml").exists() {
            return Self::load("config.local.toml");
        }

        if Path::new("config.toml").exists() {
            return Self::load("config.toml");
        }

        Err(ConfigError::ValidationError(
            "No configuration file found. Expected config.toml or config.local.toml".to_string(),
        ))
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.upload.image_max_size == 0 || self.upload.video_max_size == 0 {
            return Err(ConfigError::ValidationError(
                "upload size limits must be greater than 0".to_string(),
            ));
        }

        if self.upload.video_max_size < self.upload.image_max_size {
            return Err(ConfigError::ValidationError(
                "video_max_size must be >= image_max_size".to_string(),
            ));
        }

        // Both directories must stay directly under public_root
        for (key, dir) in [
            ("uploads_dir", &self.storage.uploads_dir),
            ("images_dir", &self.storage.images_dir),
        ] {
            let mut components = Path::new(dir).components();
            let single_normal = matches!(
                (components.next(), components.next()),
                (Some(std::path::Component::Normal(_)), None)
            );
            if !single_normal {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be a single directory name, got {:?}",
                    key, dir
                )));
            }
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be one of: {:?}",
                valid_formats
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = r#"
[server]
host = "0.0.0.0"
port = 3000
admin_host = "127.0.0.1"
admin_port = 3001

[storage]
public_root = "public"
legacy_dirs = ["server/public/uploads", "/srv/old/uploads"]

[logging]
level = "info"
format = "pretty"
"#;

    #[test]
    fn test_storage_paths() {
        let storage = StorageConfig {
            public_root: PathBuf::from("/srv/site/public"),
            uploads_dir: "uploads".to_string(),
            images_dir: "images".to_string(),
            legacy_dirs: vec![],
        };

        assert_eq!(
            storage.uploads_path(),
            PathBuf::from("/srv/site/public/uploads")
        );
        assert_eq!(
            storage.images_path(),
            PathBuf::from("/srv/site/public/images")
        );
    }

    #[test]
    fn test_load_anchors_relative_paths_to_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = Config::load(&path).unwrap();

        assert_eq!(config.storage.public_root, dir.path().join("public"));
        assert_eq!(
            config.storage.uploads_path(),
            dir.path().join("public").join("uploads")
        );
        assert_eq!(
            config.storage.legacy_dirs,
            vec![
                dir.path().join("server/public/uploads"),
                PathBuf::from("/srv/old/uploads"),
            ]
        );
        assert_eq!(config.upload.image_max_size, DEFAULT_IMAGE_MAX_SIZE);
        assert_eq!(config.upload.video_max_size, DEFAULT_VIDEO_MAX_SIZE);
        assert_eq!(config.server.cache_max_age, 3600);
    }

    #[test]
    fn test_rejects_nested_uploads_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let contents = MINIMAL.replace(
            "public_root = \"public\"",
            "public_root = \"public\"\nuploads_dir = \"../uploads\"",
        );
        std::fs::write(&path, contents).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_rejects_inverted_size_limits() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let contents = format!(
            "{}\n[upload]\nimage_max_size = 100\nvideo_max_size = 10\n",
            MINIMAL
        );
        std::fs::write(&path, contents).unwrap();

        assert!(Config::load(&path).is_err());
    }
}

//! Common test utilities and helpers.

#![allow(dead_code)]

use charity_media_server::{
    config::{Config, LoggingConfig, ServerConfig, StorageConfig, UploadConfig},
    create_admin_router, create_public_router, AppState,
};
use regex::Regex;
use std::net::TcpListener;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener as TokioTcpListener;

/// Test server instance
pub struct TestServer {
    pub public_url: String,
    pub admin_url: String,
    pub data_dir: TempDir,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a test server with random ports
    pub async fn start() -> Self {
        let public_port = get_available_port();
        let admin_port = get_available_port();
        let data_dir = TempDir::new().expect("Failed to create temp dir");

        let public_url = format!("http://127.0.0.1:{}", public_port);
        let admin_url = format!("http://127.0.0.1:{}", admin_port);

        let config = create_test_config(&data_dir, public_port, admin_port);

        let state = AppState::new(config)
            .await
            .expect("Failed to create app state");

        let public_app = create_public_router(state.clone());
        let admin_app = create_admin_router(state);

        let public_listener = TokioTcpListener::bind(("127.0.0.1", public_port))
            .await
            .expect("Failed to bind public listener");
        let admin_listener = TokioTcpListener::bind(("127.0.0.1", admin_port))
            .await
            .expect("Failed to bind admin listener");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        // Start servers in background
        tokio::spawn(async move {
            tokio::select! {
                _ = axum::serve(public_listener, public_app) => {}
                _ = axum::serve(admin_listener, admin_app) => {}
                _ = shutdown_rx => {}
            }
        });

        // Give servers time to start
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self {
            public_url,
            admin_url,
            data_dir,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get HTTP client that does not follow redirects
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    /// Get public URL
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.public_url, path)
    }

    /// Get admin URL
    pub fn admin(&self, path: &str) -> String {
        format!("{}{}", self.admin_url, path)
    }

    /// Root of the public static tree
    pub fn public_root(&self) -> PathBuf {
        self.data_dir.path().join("public")
    }

    /// Canonical upload directory
    pub fn uploads_dir(&self) -> PathBuf {
        self.public_root().join("uploads")
    }

    /// Names of all files in the canonical upload directory
    pub fn stored_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.uploads_dir())
            .expect("Failed to read uploads dir")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Create test configuration
fn create_test_config(data_dir: &TempDir, public_port: u16, admin_port: u16) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: public_port,
            admin_host: "127.0.0.1".to_string(),
            admin_port,
            cache_max_age: 3600,
        },
        storage: StorageConfig {
            public_root: data_dir.path().join("public"),
            uploads_dir: "uploads".to_string(),
            images_dir: "images".to_string(),
            legacy_dirs: vec![],
        },
        upload: UploadConfig::default(),
        logging: LoggingConfig {
            level: "warn".to_string(),
            format: "pretty".to_string(),
        },
    }
}

/// Find an available TCP port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to random port")
        .local_addr()
        .expect("Failed to get local address")
        .port()
}

/// Deterministic fixture bytes of the given length
pub fn fixture_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 256) as u8).collect()
}

/// Multipart file part
pub fn file_part(data: Vec<u8>, filename: &str, mime: &str) -> reqwest::multipart::Part {
    reqwest::multipart::Part::bytes(data)
        .file_name(filename.to_string())
        .mime_str(mime)
        .unwrap()
}

/// Assert the `image-<millis>-<rand>.<ext>` storage name shape
pub fn assert_storage_name(name: &str, ext: &str) {
    let pattern = Regex::new(&format!(r"^image-\d+-\d+\.{}$", regex::escape(ext))).unwrap();
    assert!(
        pattern.is_match(name),
        "unexpected storage name {} (expected extension {})",
        name,
        ext
    );
}

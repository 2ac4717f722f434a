//! Upload gate: admits or rejects incoming files.
//!
//! Every file goes through the same sequence:
//!
//! 1. The declared MIME type is checked against the kind's prefixes
//!    (`unsupported_media_type` on mismatch).
//! 2. A length announced ahead of the body is checked against the kind's
//!    limit (`payload_too_large` before any byte is written).
//! 3. The body is streamed into a fresh file in the canonical directory,
//!    aborting as soon as the running total crosses the limit.
//!
//! A file is only kept once the whole body has been written. Rejection,
//! a broken stream, or the request future being dropped (client abort)
//! all remove the partial file.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::config::UploadConfig;
use crate::error::{AppError, Result};
use crate::models::{KindPolicy, MediaType, StoredFile, UploadRequest};
use crate::services::naming::{current_millis, storage_filename_with};
use crate::services::storage::StorageService;

/// Attempts at finding an unused storage name before giving up
const NAME_ATTEMPTS: usize = 3;

/// Gate validating uploads and writing admitted files to storage
#[derive(Debug, Clone)]
pub struct UploadGate {
    storage: Arc<StorageService>,
    limits: UploadConfig,
    clock: fn() -> i64,
}

impl UploadGate {
    /// Create a gate writing into the given storage
    pub fn new(storage: Arc<StorageService>, limits: UploadConfig) -> Self {
        Self {
            storage,
            limits,
            clock: current_millis,
        }
    }

    /// Replace the millisecond clock used in storage names
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Validate upload metadata without reading the body
    ///
    /// # Errors
    /// `UnsupportedMediaType` if the declared MIME type does not match the
    /// kind, `PayloadTooLarge` if a declared length exceeds the limit.
    pub fn check(&self, request: &UploadRequest) -> Result<KindPolicy> {
        let policy = request.kind.policy(&self.limits);

        if !policy.accepts(&request.declared_mime) {
            return Err(AppError::unsupported_media_type(format!(
                "{} is not accepted for {} uploads",
                request.declared_mime,
                request.kind.as_str()
            )));
        }

        if let Some(len) = request.declared_len {
            if len > policy.max_size {
                return Err(too_large(len, policy.max_size));
            }
        }

        Ok(policy)
    }

    /// Admit a file: validate it and stream it into the canonical directory
    ///
    /// Returns the stored file on acceptance. On any error no file is left
    /// behind.
    pub async fn admit<S, E>(&self, request: UploadRequest, body: S) -> Result<StoredFile>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        let policy = match self.check(&request) {
            Ok(policy) => policy,
            Err(e) => {
                warn!(
                    filename = %request.original_filename,
                    mime = %request.declared_mime,
                    kind = request.kind.as_str(),
                    reason = e.code(),
                    "Upload rejected"
                );
                return Err(e);
            }
        };

        self.storage.ensure_dir().await?;

        let (mut partial, mut file) = self.create_target(&request.original_filename).await?;

        let mut body = std::pin::pin!(body);
        let mut written: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| AppError::validation(format!("Upload interrupted: {}", e)))?;

            written = written.saturating_add(chunk.len() as u64);
            if written > policy.max_size {
                warn!(
                    filename = %request.original_filename,
                    kind = request.kind.as_str(),
                    limit = policy.max_size,
                    "Upload aborted mid-stream, size limit crossed"
                );
                return Err(too_large(written, policy.max_size));
            }

            file.write_all(&chunk).await.map_err(|e| write_failed(&partial.path, e))?;
        }

        if written == 0 {
            return Err(AppError::validation(format!(
                "Uploaded file {} is empty",
                request.original_filename
            )));
        }

        file.flush().await.map_err(|e| write_failed(&partial.path, e))?;
        drop(file);

        let filename = partial.commit();
        let media_type = MediaType::from_mime(&request.declared_mime.to_ascii_lowercase())
            .unwrap_or(MediaType::Image);

        info!(
            filename = %filename,
            original = %request.original_filename,
            mime = %request.declared_mime,
            kind = request.kind.as_str(),
            size = written,
            "Upload admitted"
        );

        Ok(StoredFile {
            filename,
            original_filename: request.original_filename,
            mime_type: request.declared_mime,
            media_type,
            size: written,
        })
    }

    /// Open a new file under a freshly generated name, never reusing one
    async fn create_target(&self, original_filename: &str) -> Result<(PartialUpload, File)> {
        for _ in 0..NAME_ATTEMPTS {
            let name = storage_filename_with(original_filename, (self.clock)());
            let path = self
                .storage
                .upload_path(&name)
                .ok_or_else(|| AppError::internal(format!("Generated invalid name {}", name)))?;

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => {
                    debug!(path = %path.display(), "Opened upload target");
                    return Ok((PartialUpload::new(name, path), file));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(name = %name, "Storage name taken, regenerating");
                }
                Err(e) => {
                    return Err(AppError::storage_unavailable(format!(
                        "cannot create {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        }

        Err(AppError::internal("Could not find a free storage name"))
    }
}

/// File being written; removed on drop unless committed
#[derive(Debug)]
struct PartialUpload {
    name: String,
    path: PathBuf,
    committed: bool,
}

impl PartialUpload {
    fn new(name: String, path: PathBuf) -> Self {
        Self {
            name,
            path,
            committed: false,
        }
    }

    fn commit(&mut self) -> String {
        self.committed = true;
        std::mem::take(&mut self.name)
    }
}

impl Drop for PartialUpload {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Drop cannot await
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed partial upload"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove partial upload"
            ),
        }
    }
}

fn too_large(size: u64, limit: u64) -> AppError {
    AppError::payload_too_large(format!(
        "File size {} exceeds maximum allowed size {}",
        size, limit
    ))
}

fn write_failed(path: &std::path::Path, err: std::io::Error) -> AppError {
    AppError::storage_unavailable(format!("cannot write {}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadKind;
    use futures::stream;
    use tempfile::TempDir;

    const MIB: usize = 1024 * 1024;

    async fn create_test_gate() -> (UploadGate, Arc<StorageService>, TempDir) {
        let temp = TempDir::new().unwrap();
        let public = temp.path().join("public");
        let storage = StorageService::at(public.join("uploads"), public.join("images")).unwrap();
        storage.ensure_dir().await.unwrap();
        let storage = Arc::new(storage);
        let gate = UploadGate::new(storage.clone(), UploadConfig::default());
        (gate, storage, temp)
    }

    /// Body split into 64 KiB chunks, like a multipart field would arrive
    fn body(len: usize) -> impl Stream<Item = std::result::Result<Bytes, std::io::Error>> {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let chunks: Vec<_> = data
            .chunks(64 * 1024)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        stream::iter(chunks)
    }

    async fn file_count(storage: &StorageService) -> usize {
        storage.list_uploads().await.unwrap().len()
    }

    #[tokio::test]
    async fn test_rejects_pdf_for_image() {
        let (gate, storage, _temp) = create_test_gate().await;
        let request = UploadRequest::new("report.pdf", "application/pdf", UploadKind::Image);

        let err = gate.admit(request, body(1024)).await.unwrap_err();

        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
        assert_eq!(file_count(&storage).await, 0);
    }

    #[tokio::test]
    async fn test_accepts_4mib_png_for_image() {
        let (gate, storage, _temp) = create_test_gate().await;
        let request = UploadRequest::new("photo.png", "image/png", UploadKind::Image);

        let stored = gate.admit(request, body(4 * MIB)).await.unwrap();

        assert!(stored.filename.starts_with("image-"));
        assert!(stored.filename.ends_with(".png"));
        assert_eq!(stored.size, (4 * MIB) as u64);
        assert_eq!(stored.media_type, MediaType::Image);

        let on_disk = storage.uploads_dir().join(&stored.filename);
        assert_eq!(std::fs::metadata(on_disk).unwrap().len(), (4 * MIB) as u64);
    }

    #[tokio::test]
    async fn test_6mib_png_rejected_for_image_but_accepted_for_any() {
        let (gate, storage, _temp) = create_test_gate().await;

        let request = UploadRequest::new("big.png", "image/png", UploadKind::Image);
        let err = gate.admit(request, body(6 * MIB)).await.unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert_eq!(file_count(&storage).await, 0, "partial file left behind");

        let request = UploadRequest::new("big.png", "image/png", UploadKind::Any);
        let stored = gate.admit(request, body(6 * MIB)).await.unwrap();
        assert_eq!(stored.size, (6 * MIB) as u64);
        assert_eq!(file_count(&storage).await, 1);
    }

    #[tokio::test]
    async fn test_declared_length_rejected_before_transfer() {
        let (gate, storage, _temp) = create_test_gate().await;
        let request = UploadRequest::new("big.png", "image/png", UploadKind::Image)
            .with_declared_len(Some(6 * MIB as u64));

        // A body that would fail if it were ever polled
        let never = stream::once(async {
            Err::<Bytes, _>(std::io::Error::new(ErrorKind::Other, "polled"))
        });
        let err = gate.admit(request, never).await.unwrap_err();

        assert!(matches!(err, AppError::PayloadTooLarge(_)));
        assert_eq!(file_count(&storage).await, 0);
    }

    #[tokio::test]
    async fn test_video_kind() {
        let (gate, _storage, _temp) = create_test_gate().await;

        let request = UploadRequest::new("clip.mp4", "video/mp4", UploadKind::Video);
        let stored = gate.admit(request, body(MIB)).await.unwrap();
        assert_eq!(stored.media_type, MediaType::Video);
        assert!(stored.filename.ends_with(".mp4"));

        let request = UploadRequest::new("photo.jpg", "image/jpeg", UploadKind::Video);
        let err = gate.admit(request, body(MIB)).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMediaType(_)));
    }

    #[tokio::test]
    async fn test_broken_stream_leaves_nothing() {
        let (gate, storage, _temp) = create_test_gate().await;
        let request = UploadRequest::new("photo.jpg", "image/jpeg", UploadKind::Image);

        let broken = stream::iter(vec![
            Ok(Bytes::from_static(b"first chunk")),
            Err(std::io::Error::new(ErrorKind::ConnectionReset, "client went away")),
        ]);
        let err = gate.admit(request, broken).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(file_count(&storage).await, 0);
    }

    #[tokio::test]
    async fn test_dropped_upload_leaves_nothing() {
        let (gate, storage, _temp) = create_test_gate().await;
        let request = UploadRequest::new("photo.jpg", "image/jpeg", UploadKind::Image);

        // First chunk arrives, then the client stalls forever
        let stalled = stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(b"abc"))])
            .chain(stream::pending());

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(100),
            gate.admit(request, stalled),
        )
        .await;

        assert!(result.is_err(), "upload should still be pending");
        assert_eq!(file_count(&storage).await, 0);
    }

    #[tokio::test]
    async fn test_empty_file_rejected() {
        let (gate, storage, _temp) = create_test_gate().await;
        let request = UploadRequest::new("empty.png", "image/png", UploadKind::Image);

        let err = gate
            .admit(request, stream::empty::<std::result::Result<Bytes, std::io::Error>>())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(file_count(&storage).await, 0);
    }

    #[tokio::test]
    async fn test_missing_directory_is_recreated() {
        let (gate, storage, _temp) = create_test_gate().await;
        std::fs::remove_dir_all(storage.uploads_dir()).unwrap();

        let request = UploadRequest::new("photo.jpg", "image/jpeg", UploadKind::Image);
        let stored = gate.admit(request, body(128)).await.unwrap();

        assert!(storage.uploads_dir().join(stored.filename).is_file());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_uploads_in_one_millisecond_never_share_a_file() {
        let (gate, storage, _temp) = create_test_gate().await;
        let gate = gate.with_clock(|| 1_700_000_000_000);

        let handles: Vec<_> = (0..200)
            .map(|i| {
                let gate = gate.clone();
                tokio::spawn(async move {
                    let request = UploadRequest::new("same.png", "image/png", UploadKind::Image);
                    gate.admit(request, body(1024 + i)).await
                })
            })
            .collect();

        let mut names = std::collections::HashSet::new();
        for handle in handles {
            let stored = handle.await.unwrap().unwrap();
            assert!(stored.filename.starts_with("image-1700000000000-"));
            assert!(names.insert(stored.filename), "two uploads got one name");
        }

        // Every upload kept its own bytes
        let entries = storage.list_uploads().await.unwrap();
        assert_eq!(entries.len(), 200);
        let mut sizes: Vec<u64> = entries.iter().map(|e| e.size).collect();
        sizes.sort_unstable();
        let expected: Vec<u64> = (0..200).map(|i| 1024 + i as u64).collect();
        assert_eq!(sizes, expected);
    }
}

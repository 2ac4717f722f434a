//! Upload migration integration tests.

use charity_media_server::services::{migrate_uploads, StorageService};
use sha2::{Digest, Sha256};
use std::path::Path;
use tempfile::TempDir;

fn digest(path: &Path) -> Vec<u8> {
    Sha256::digest(std::fs::read(path).unwrap()).to_vec()
}

async fn create_storage(root: &Path) -> StorageService {
    let public = root.join("public");
    let storage = StorageService::at(public.join("uploads"), public.join("images")).unwrap();
    storage.ensure_dir().await.unwrap();
    storage
}

#[tokio::test]
async fn test_migration_never_overwrites_canonical_files() {
    let temp = TempDir::new().unwrap();
    let storage = create_storage(temp.path()).await;

    let legacy = temp.path().join("server/public/uploads");
    std::fs::create_dir_all(&legacy).unwrap();
    std::fs::write(legacy.join("a.jpg"), b"new file from legacy dir").unwrap();
    std::fs::write(legacy.join("b.jpg"), b"stale legacy copy").unwrap();
    std::fs::write(storage.uploads_dir().join("b.jpg"), b"canonical copy").unwrap();

    let canonical_b = storage.uploads_dir().join("b.jpg");
    let before = digest(&canonical_b);

    let report = migrate_uploads(&storage, &[legacy.clone()]).await.unwrap();

    assert_eq!(report.copied, vec!["a.jpg".to_string()]);
    assert_eq!(report.skipped, vec!["b.jpg".to_string()]);
    assert!(report.failed.is_empty());

    assert_eq!(
        digest(&storage.uploads_dir().join("a.jpg")),
        digest(&legacy.join("a.jpg"))
    );
    assert_eq!(digest(&canonical_b), before);
    assert_ne!(digest(&canonical_b), digest(&legacy.join("b.jpg")));
}

#[tokio::test]
async fn test_migration_merges_several_candidates() {
    let temp = TempDir::new().unwrap();
    let storage = create_storage(temp.path()).await;

    let first = temp.path().join("uploads");
    let second = temp.path().join("server/uploads");
    std::fs::create_dir_all(&first).unwrap();
    std::fs::create_dir_all(&second).unwrap();
    std::fs::write(first.join("x.png"), b"first x").unwrap();
    std::fs::write(second.join("x.png"), b"second x").unwrap();
    std::fs::write(second.join("y.mp4"), b"second y").unwrap();

    let report = migrate_uploads(&storage, &[first, second]).await.unwrap();

    assert_eq!(report.scanned_dirs.len(), 2);
    assert_eq!(report.copied.len(), 2);
    assert_eq!(report.skipped, vec!["x.png".to_string()]);
    // First candidate wins
    assert_eq!(
        std::fs::read(storage.uploads_dir().join("x.png")).unwrap(),
        b"first x"
    );
}

#[tokio::test]
async fn test_migration_creates_canonical_directory() {
    let temp = TempDir::new().unwrap();
    let public = temp.path().join("public");
    let storage = StorageService::at(public.join("uploads"), public.join("images")).unwrap();

    let legacy = temp.path().join("uploads");
    std::fs::create_dir_all(&legacy).unwrap();
    std::fs::write(legacy.join("a.jpg"), b"a").unwrap();

    let report = migrate_uploads(&storage, &[legacy]).await.unwrap();

    assert_eq!(report.copied.len(), 1);
    assert!(storage.uploads_dir().join("a.jpg").is_file());
}

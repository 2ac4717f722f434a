//! Storage filename generation.
//!
//! Uploaded files are stored flat in the canonical directory as
//! `image-<unix millis>-<random 0..1e9>.<ext>`. The extension is taken from
//! the last path component of the client filename and kept as sent, so
//! separators or `..` in the client name can never reach the storage name.

use chrono::Utc;
use rand::Rng;
use std::path::Path;

/// Fixed prefix of every storage filename
pub const STORAGE_PREFIX: &str = "image";

/// Upper bound (exclusive) of the random suffix
const RANDOM_SUFFIX_BOUND: u32 = 1_000_000_000;

/// Current time in unix milliseconds
pub fn current_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generate a storage filename at a given timestamp with a random suffix
pub fn storage_filename_with(original_filename: &str, unix_millis: i64) -> String {
    let suffix = rand::thread_rng().gen_range(0..RANDOM_SUFFIX_BOUND);
    storage_filename_at(original_filename, unix_millis, suffix)
}

/// Build a storage filename from explicit timestamp and suffix
pub fn storage_filename_at(original_filename: &str, unix_millis: i64, suffix: u32) -> String {
    match extension_of(original_filename) {
        Some(ext) => format!("{}-{}-{}.{}", STORAGE_PREFIX, unix_millis, suffix, ext),
        None => format!("{}-{}-{}", STORAGE_PREFIX, unix_millis, suffix),
    }
}

/// Extension of the client filename, verbatim.
///
/// `None` when there is no extension, or when it carries a NUL or a
/// backslash (a Windows separator that `Path` does not split on here).
pub fn extension_of(original_filename: &str) -> Option<&str> {
    let ext = Path::new(original_filename).extension()?.to_str()?;
    if ext.is_empty() || ext.contains(['\0', '/', '\\']) {
        return None;
    }
    Some(ext)
}

//! Upload kinds and stored file types.
//!
//! An upload kind is chosen once per upload and selects the MIME prefixes
//! and size limit the upload gate enforces for it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::UploadConfig;

/// Media type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Image file (JPEG, PNG, GIF, WebP, ...)
    Image,
    /// Video file (MP4, WebM, ...)
    Video,
}

impl MediaType {
    /// Get media type from MIME type string
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// Declared category of an upload field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    /// Image-only field
    Image,
    /// Video-only field
    Video,
    /// Mixed field accepting either
    Any,
}

/// What an upload kind accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindPolicy {
    /// Accepted MIME type prefixes
    pub mime_prefixes: &'static [&'static str],
    /// Maximum size in bytes
    pub max_size: u64,
}

impl KindPolicy {
    /// Check a declared MIME type against the accepted prefixes
    pub fn accepts(&self, mime: &str) -> bool {
        let mime = mime.trim().to_ascii_lowercase();
        self.mime_prefixes.iter().any(|p| mime.starts_with(p))
    }
}

impl UploadKind {
    /// Parse the admin route segment (`image`, `video` or `any`)
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    /// Select the (prefixes, limit) row for this kind
    pub fn policy(self, limits: &UploadConfig) -> KindPolicy {
        match self {
            Self::Image => KindPolicy {
                mime_prefixes: &["image/"],
                max_size: limits.image_max_size,
            },
            Self::Video => KindPolicy {
                mime_prefixes: &["video/"],
                max_size: limits.video_max_size,
            },
            Self::Any => KindPolicy {
                mime_prefixes: &["image/", "video/"],
                max_size: limits.video_max_size,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Any => "any",
        }
    }
}

/// Metadata of one incoming file, before the gate has seen its bytes
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Filename supplied by the client
    pub original_filename: String,
    /// MIME type declared by the client
    pub declared_mime: String,
    /// Field kind the upload arrived on
    pub kind: UploadKind,
    /// Length announced before transfer, if the part headers carry one
    pub declared_len: Option<u64>,
}

impl UploadRequest {
    pub fn new(
        original_filename: impl Into<String>,
        declared_mime: impl Into<String>,
        kind: UploadKind,
    ) -> Self {
        Self {
            original_filename: original_filename.into(),
            declared_mime: declared_mime.into(),
            kind,
            declared_len: None,
        }
    }

    /// Attach a length announced ahead of the body
    pub fn with_declared_len(mut self, len: Option<u64>) -> Self {
        self.declared_len = len;
        self
    }
}

/// A file admitted into the canonical upload directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    /// Storage filename (`image-<millis>-<rand>.<ext>`)
    pub filename: String,
    /// Original filename supplied by the client
    pub original_filename: String,
    /// Declared MIME type
    pub mime_type: String,
    /// Media type derived from the MIME type
    pub media_type: MediaType,
    /// Bytes written
    pub size: u64,
}

/// Entry of the upload directory listing
#[derive(Debug, Clone, Serialize)]
pub struct UploadEntry {
    pub filename: String,
    pub size: u64,
    pub modified_at: Option<DateTime<Utc>>,
}

//! Media references carried by content records.
//!
//! Projects and blog posts store the filename of their image and video.
//! A record without an uploaded image points at its sentinel default.
//! References are never cleared when a record is deleted; the stored file
//! stays in the upload directory.

use serde::{Deserialize, Serialize};

use super::media::StoredFile;

/// Sentinel image used by projects without an upload
pub const DEFAULT_PROJECT_IMAGE: &str = "default-project.jpg";
/// Sentinel image used by blog posts without an upload
pub const DEFAULT_BLOG_IMAGE: &str = "default-blog.jpg";

/// Kind of content record a submission belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Project,
    Blog,
}

impl ContentKind {
    /// Parse the admin route segment (`projects` or `blog`)
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "projects" => Some(Self::Project),
            "blog" => Some(Self::Blog),
            _ => None,
        }
    }

    pub fn default_image(&self) -> &'static str {
        match self {
            Self::Project => DEFAULT_PROJECT_IMAGE,
            Self::Blog => DEFAULT_BLOG_IMAGE,
        }
    }

    /// Check whether a name is one of the sentinel defaults
    pub fn is_sentinel(name: &str) -> bool {
        name == DEFAULT_PROJECT_IMAGE || name == DEFAULT_BLOG_IMAGE
    }
}

/// Content field a file is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSlot {
    Image,
    Video,
}

impl MediaSlot {
    /// Map a multipart field name to its slot
    pub fn from_field(name: &str) -> Option<Self> {
        match name {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// Files admitted for one submission
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdmittedMedia {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<StoredFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<StoredFile>,
}

impl AdmittedMedia {
    pub fn slot(&self, slot: MediaSlot) -> Option<&StoredFile> {
        match slot {
            MediaSlot::Image => self.image.as_ref(),
            MediaSlot::Video => self.video.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: MediaSlot) -> &mut Option<StoredFile> {
        match slot {
            MediaSlot::Image => &mut self.image,
            MediaSlot::Video => &mut self.video,
        }
    }

    /// Filenames of everything admitted, in no particular order
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.image
            .iter()
            .chain(self.video.iter())
            .map(|f| f.filename.as_str())
    }
}

/// Image and video references of a newly created record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaReferences {
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

impl MediaReferences {
    /// References for a newly created record
    pub fn for_create(kind: ContentKind, admitted: &AdmittedMedia) -> Self {
        Self {
            image: admitted
                .image
                .as_ref()
                .map(|f| f.filename.clone())
                .unwrap_or_else(|| kind.default_image().to_string()),
            video: admitted.video.as_ref().map(|f| f.filename.clone()),
        }
    }
}

/// Reference changes for an edited record.
///
/// Only slots that received a new file are present; the record keeps its
/// current value for the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
}

impl MediaUpdate {
    pub fn from_admitted(admitted: &AdmittedMedia) -> Self {
        Self {
            image: admitted.image.as_ref().map(|f| f.filename.clone()),
            video: admitted.video.as_ref().map(|f| f.filename.clone()),
        }
    }
}

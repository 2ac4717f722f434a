//! Data models for the charity media server.
//!
//! This module contains the upload and media-reference types shared by the
//! services and handlers.

mod content;
mod media;

pub use content::*;
pub use media::*;

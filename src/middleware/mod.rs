//! Middleware components for the charity media server.
//!
//! This module contains middleware for:
//! - Resolving `/uploads/<name>` requests to files, redirects or the next handler

pub mod media;

pub use media::MediaResolutionLayer;

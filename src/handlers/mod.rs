//! HTTP request handlers for the charity media server.
//!
//! This module contains all endpoint handlers organized by functionality:
//! - `admin`: Upload submissions and directory listing (local only)
//! - `serve`: Static images and placeholder fallback
//! - `health`: Health check endpoints

pub mod admin;
pub mod health;
pub mod serve;

pub use admin::admin_routes;
pub use health::health_routes;
pub use serve::serve_routes;

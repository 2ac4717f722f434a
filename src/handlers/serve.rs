//! Static image serving with placeholder synthesis.
//!
//! ## Endpoints
//!
//! - `GET /images/{name}` - Serve a static image; sentinel defaults that are
//!   missing on disk are answered with a generated SVG placeholder so page
//!   layouts never break
//!
//! Upload files themselves (`/uploads/{name}`) are answered by the media
//! resolution middleware, which shares [`file_response`] with this module.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Router,
};
use std::path::Path as FsPath;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::ContentKind;
use crate::services::placeholder::{caption_for, placeholder_svg, SVG_MIME_TYPE};
use crate::state::AppState;

/// Serve a static image
///
/// GET /images/{name}
async fn serve_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response> {
    if let Some(path) = state.storage.image_path(&name) {
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if is_file {
            return file_response(&path, state.cache_max_age(), false).await;
        }
    }

    if !ContentKind::is_sentinel(&name) {
        return Err(AppError::not_found(format!("Image not found: {}", name)));
    }

    info!(name = %name, "Default image missing, generating placeholder");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, SVG_MIME_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .header("X-Content-Type-Options", "nosniff")
        .body(Body::from(placeholder_svg(&caption_for(&name))))
        .map_err(|e| AppError::internal(format!("Failed to build response: {}", e)))
}

/// Stream a file from disk with content type and cache headers
pub async fn file_response(path: &FsPath, cache_max_age: u64, head_only: bool) -> Result<Response> {
    let file = File::open(path).await?;
    let len = file.metadata().await?.len();

    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    let cache_control = format!("public, max-age={}", cache_max_age);

    let body = if head_only {
        Body::empty()
    } else {
        Body::from_stream(ReaderStream::new(file))
    };

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, len)
        .header(header::CACHE_CONTROL, cache_control)
        .header("X-Content-Type-Options", "nosniff")
        .body(body)
        .map_err(|e| AppError::internal(format!("Failed to build response: {}", e)))?;

    debug!(path = %path.display(), size = len, "Streaming file");

    Ok(response)
}

/// Create serve routes
pub fn serve_routes() -> Router<AppState> {
    Router::new().route("/{name}", get(serve_image))
}

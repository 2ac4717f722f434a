//! # Charity Media Server
//!
//! Upload and media serving for the charity website.
//!
//! ## Features
//!
//! - **Upload Gate**: per-field MIME and size checks, streamed to disk,
//!   nothing left behind on rejection or client abort
//! - **Single Upload Directory**: one canonical directory for writing and
//!   serving, created on demand
//! - **Media Resolution**: missing uploads redirect to a default image,
//!   missing defaults are answered with an SVG placeholder
//! - **Migration**: one-off copy of uploads out of historical directories
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │    Public listener          Admin listener      │
//! │  ┌──────────────────┐    ┌──────────────────┐   │
//! │  │ Media resolution │    │ Upload submission│   │
//! │  │ /images, /health │    │ Upload listing   │   │
//! │  └──────────────────┘    └──────────────────┘   │
//! ├─────────────────────────────────────────────────┤
//! │                   Services                       │
//! │  ┌────────────┐ ┌────────────┐ ┌─────────────┐  │
//! │  │  Media     │ │  Upload    │ │  Storage    │  │
//! │  │  Resolver  │ │  Gate      │ │  Service    │  │
//! │  └────────────┘ └────────────┘ └─────────────┘  │
//! ├─────────────────────────────────────────────────┤
//! │            public/uploads (file system)          │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the server
//! cargo run --release
//!
//! # Upload a project image (admin listener)
//! curl -X POST http://127.0.0.1:3001/admin/uploads/projects -F "image=@school.jpg"
//!
//! # Fetch it (public listener)
//! curl http://localhost:3000/uploads/image-1718000000000-123456789.jpg
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use middleware::MediaResolutionLayer;
pub use state::AppState;

use axum::{extract::DefaultBodyLimit, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

/// Slack on top of the file limits for multipart framing and text fields
const MULTIPART_OVERHEAD: u64 = 1024 * 1024;

/// Run the media server with the given configuration.
///
/// This function starts both the public and admin listeners.
pub async fn run(config: Config) -> anyhow::Result<()> {
    // A missing or unwritable upload directory stops startup here
    let state = AppState::new(config.clone()).await?;

    let public_app = create_public_router(state.clone());
    let admin_app = create_admin_router(state.clone());

    let public_addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid public server address: {}", e))?;

    let admin_addr: SocketAddr =
        format!("{}:{}", config.server.admin_host, config.server.admin_port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid admin server address: {}", e))?;

    info!(
        address = %public_addr,
        uploads = %state.storage.uploads_dir().display(),
        "Public server starting"
    );

    info!(address = %admin_addr, "Admin server starting");

    let public_listener = TcpListener::bind(public_addr).await?;
    let admin_listener = TcpListener::bind(admin_addr).await?;

    tokio::select! {
        result = axum::serve(public_listener, public_app) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Public server error");
            }
        }
        result = axum::serve(admin_listener, admin_app) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin server error");
            }
        }
    }

    Ok(())
}

/// Create the public router
///
/// `/uploads/*` is answered by the media resolution middleware; whatever it
/// defers, and any other unmatched path, falls through to the static tree.
pub fn create_public_router(state: AppState) -> Router {
    let media = MediaResolutionLayer::new(state.resolver.clone(), state.cache_max_age());
    let static_files = ServeDir::new(&state.config.storage.public_root);

    Router::new()
        .nest("/images", handlers::serve_routes())
        .nest("/health", handlers::health_routes())
        .fallback_service(static_files)
        .layer(media)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create the admin router (localhost only)
pub fn create_admin_router(state: AppState) -> Router {
    // One image and one video field, each up to the video limit
    let body_limit = 2 * state.config.upload.video_max_size + MULTIPART_OVERHEAD;

    Router::new()
        .nest("/admin", handlers::admin_routes())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit as usize))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

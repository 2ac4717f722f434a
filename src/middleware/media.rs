//! Media resolution middleware for `/uploads/<name>`.
//!
//! Sits in front of the public router. `GET`/`HEAD` requests under
//! `/uploads/` are resolved against the canonical directory:
//!
//! - file present: streamed back with its content type
//! - browser auto-request (favicon, logo): passed to the next handler
//! - anything else: `302 Found` to the default project image
//!
//! Every other request passes through untouched.
//!
//! # Example
//!
//! ```rust,ignore
//! let media = MediaResolutionLayer::new(MediaResolver::new(storage), 3600);
//! let app = Router::new()
//!     .fallback_service(ServeDir::new(public_root))
//!     .layer(media);
//! ```

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::{debug, warn};

use crate::handlers::serve::file_response;
use crate::services::media_resolver::{MediaResolver, Resolution};

/// URL prefix handled by the middleware
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// Tower Layer resolving upload requests
#[derive(Clone)]
pub struct MediaResolutionLayer {
    resolver: MediaResolver,
    cache_max_age: u64,
}

impl MediaResolutionLayer {
    pub fn new(resolver: MediaResolver, cache_max_age: u64) -> Self {
        Self {
            resolver,
            cache_max_age,
        }
    }
}

impl<S> Layer<S> for MediaResolutionLayer {
    type Service = MediaResolutionMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MediaResolutionMiddleware {
            inner,
            resolver: self.resolver.clone(),
            cache_max_age: self.cache_max_age,
        }
    }
}

/// Media resolution middleware service
#[derive(Clone)]
pub struct MediaResolutionMiddleware<S> {
    inner: S,
    resolver: MediaResolver,
    cache_max_age: u64,
}

impl<S> Service<Request<Body>> for MediaResolutionMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // Keep the service that poll_ready prepared
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        let Some(name) = requested_name(&req) else {
            return Box::pin(async move { inner.call(req).await });
        };

        let resolver = self.resolver.clone();
        let cache_max_age = self.cache_max_age;
        let head_only = req.method() == Method::HEAD;

        Box::pin(async move {
            match resolver.resolve(&name).await {
                Resolution::Served(path) => {
                    match file_response(&path, cache_max_age, head_only).await {
                        Ok(response) => {
                            debug!(name = %name, "Served upload");
                            Ok(response)
                        }
                        // Removed between the existence check and the open
                        Err(e) => {
                            warn!(name = %name, error = %e, "Upload vanished while serving");
                            Ok(found(&crate::services::media_resolver::default_asset_path()))
                        }
                    }
                }
                Resolution::Deferred => {
                    debug!(name = %name, "Deferring browser asset request");
                    inner.call(req).await
                }
                Resolution::Fallback(location) => {
                    debug!(name = %name, location = %location, "Upload missing, redirecting");
                    Ok(found(&location))
                }
            }
        })
    }
}

/// Decoded upload name for `GET`/`HEAD /uploads/<name>`, if this is one
fn requested_name<B>(req: &Request<B>) -> Option<String> {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return None;
    }

    let raw = req.uri().path().strip_prefix(UPLOADS_PREFIX)?;

    // Undecodable names resolve to nothing and end up at the fallback
    Some(
        percent_decode_str(raw)
            .decode_utf8()
            .map(|s| s.into_owned())
            .unwrap_or_default(),
    )
}

/// `302 Found` redirect
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

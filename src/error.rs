//! Error types for the charity media server.
//!
//! This module defines a unified error handling system using `thiserror`.
//! All errors are converted to appropriate HTTP responses automatically.
//!
//! # Error Categories
//!
//! - **Client errors (4xx)**: rejected uploads, malformed submissions
//! - **Server errors (5xx)**: storage unavailable, I/O failures
//!
//! The read path never surfaces `NotFound` to visitors; missing media is
//! resolved to a redirect or placeholder before an error is built.
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::error::{AppError, Result};
//!
//! fn check(mime: &str) -> Result<()> {
//!     if !mime.starts_with("image/") {
//!         return Err(AppError::unsupported_media_type(mime));
//!     }
//!     Ok(())
//! }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
///
/// Each variant is mapped to an appropriate HTTP status code.
#[derive(Debug, Error)]
pub enum AppError {
    // -------------------------------------------------------------------------
    // Client Errors (4xx)
    // -------------------------------------------------------------------------
    /// Invalid request or validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Declared MIME type not accepted for the upload kind
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Upload exceeded the size limit for its kind
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    // -------------------------------------------------------------------------
    // Server Errors (5xx)
    // -------------------------------------------------------------------------
    /// Canonical upload directory missing or unwritable
    #[error("Error uploading media: storage unavailable ({0})")]
    StorageUnavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    // -------------------------------------------------------------------------
    // Convenience constructors
    // -------------------------------------------------------------------------

    /// Create a validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an unsupported media type error
    pub fn unsupported_media_type<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedMediaType(msg.into())
    }

    /// Create a payload too large error
    pub fn payload_too_large<S: Into<String>>(msg: S) -> Self {
        Self::PayloadTooLarge(msg.into())
    }

    /// Create a storage unavailable error
    pub fn storage_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,

            // 5xx Server Errors
            Self::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable code used in error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::Internal(_) => "internal_error",
            Self::Io(_) => "io_error",
            Self::Config(_) => "config_error",
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

/// Error response body sent to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type/code
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// HTTP status code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Add status code to the response
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status.as_u16());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.is_server_error() {
            tracing::error!(error = %self, "Server error occurred");
        } else {
            tracing::debug!(error = %self, "Client error occurred");
        }

        // Storage failures are reported to the admin as a failed submission;
        // other server errors keep their details in the log only.
        let message = match &self {
            Self::StorageUnavailable(_) => {
                "Error uploading media: upload storage is unavailable".to_string()
            }
            _ if self.is_server_error() => {
                "An internal error occurred. Please try again later.".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse::new(self.code(), message).with_status(status);

        (status, Json(body)).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::Validation(format!("Invalid multipart data: {}", err))
    }
}

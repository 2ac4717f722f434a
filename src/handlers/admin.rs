//! Admin API handlers (local only).
//!
//! These endpoints back the admin panel's project and blog forms. They are
//! served on the admin listener, which is bound to localhost.
//!
//! ## Endpoints
//!
//! - `POST /admin/uploads/{content}` - Admit the media of a new project/blog
//! - `POST /admin/uploads/{content}/{id}` - Admit the media of an edit
//! - `POST /admin/media/{kind}` - Admit a single `image`, `video` or `any` file
//! - `GET /admin/uploads` - List the canonical upload directory
//!
//! Content submissions take at most one `image` and one `video` field. Both
//! fields accept images and videos up to the video limit; each file is
//! attached to the reference named by its field.
//!
//! # Example: Create a project with image and video
//!
//! ```bash
//! curl -X POST http://127.0.0.1:3001/admin/uploads/projects \
//!   -F "image=@school.jpg" \
//!   -F "video=@opening.mp4"
//! ```
//!
//! # Example: Edit, replacing only the image
//!
//! ```bash
//! curl -X POST http://127.0.0.1:3001/admin/uploads/blog/65f0c2 \
//!   -F "image=@new.png"
//! ```

use axum::{
    extract::{multipart::Field, Multipart, Path, State},
    http::{header, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::{
    AdmittedMedia, ContentKind, MediaReferences, MediaSlot, MediaUpdate, StoredFile, UploadEntry,
    UploadKind, UploadRequest,
};
use crate::state::AppState;

/// Multipart field carrying the file of a single-file upload
const MEDIA_FIELD: &str = "file";

/// Result of a create submission
#[derive(Debug, Serialize)]
pub struct MediaSubmissionResponse {
    /// Kind of content record the media belongs to
    pub content: ContentKind,
    /// References the caller should store on its new record
    pub references: MediaReferences,
    /// Files admitted by this submission
    pub admitted: AdmittedMedia,
}

/// Result of an edit submission
#[derive(Debug, Serialize)]
pub struct MediaEditResponse {
    pub content: ContentKind,
    /// Record the edit belongs to
    pub id: String,
    /// References to overwrite; absent slots stay as they are
    pub update: MediaUpdate,
    pub admitted: AdmittedMedia,
}

/// Admit the media of a new project or blog post
///
/// POST /admin/uploads/{content}
///
/// An omitted image falls back to the content kind's sentinel default.
async fn submit_create(
    State(state): State<AppState>,
    Path(content): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<MediaSubmissionResponse>)> {
    let kind = content_kind(&content)?;
    let admitted = collect_media(&state, multipart).await?;
    let references = MediaReferences::for_create(kind, &admitted);

    info!(
        content = %content,
        image = %references.image,
        video = references.video.as_deref().unwrap_or("-"),
        "Media for new record accepted"
    );

    Ok((
        StatusCode::CREATED,
        Json(MediaSubmissionResponse {
            content: kind,
            references,
            admitted,
        }),
    ))
}

/// Admit the media of an edited project or blog post
///
/// POST /admin/uploads/{content}/{id}
///
/// Only slots that received a file are reported; omitted files leave the
/// record's existing references untouched.
async fn submit_edit(
    State(state): State<AppState>,
    Path((content, id)): Path<(String, String)>,
    multipart: Multipart,
) -> Result<Json<MediaEditResponse>> {
    let kind = content_kind(&content)?;
    let admitted = collect_media(&state, multipart).await?;
    let update = MediaUpdate::from_admitted(&admitted);

    info!(
        content = %content,
        id = %id,
        image = update.image.as_deref().unwrap_or("-"),
        video = update.video.as_deref().unwrap_or("-"),
        "Media for edited record accepted"
    );

    Ok(Json(MediaEditResponse {
        content: kind,
        id,
        update,
        admitted,
    }))
}

/// Admit a single file of an explicit kind
///
/// POST /admin/media/{kind}
async fn upload_media(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<StoredFile>)> {
    let kind = UploadKind::from_segment(&kind)
        .ok_or_else(|| AppError::not_found(format!("Unknown upload kind: {}", kind)))?;

    let mut stored: Option<StoredFile> = None;
    let outcome: Result<()> = async {
        while let Some(field) = multipart.next_field().await? {
            if field.name() != Some(MEDIA_FIELD) {
                continue;
            }
            if stored.is_some() {
                return Err(AppError::validation("Only one file is accepted per upload"));
            }
            stored = admit_field(&state, field, kind).await?;
        }
        Ok(())
    }
    .await;

    match (outcome, stored) {
        (Ok(()), Some(file)) => Ok((StatusCode::CREATED, Json(file))),
        (Ok(()), None) => Err(AppError::validation("No file provided")),
        (Err(e), stored) => {
            if let Some(file) = stored {
                discard(&state, &file.filename).await;
            }
            warn!(kind = kind.as_str(), error = %e, "Media upload failed");
            drain(&mut multipart).await;
            Err(e)
        }
    }
}

/// Run every `image`/`video` field of a submission through the gate.
///
/// A failed submission keeps nothing it already admitted.
async fn collect_media(state: &AppState, mut multipart: Multipart) -> Result<AdmittedMedia> {
    let mut admitted = AdmittedMedia::default();

    let outcome: Result<()> = async {
        while let Some(field) = multipart.next_field().await? {
            let Some(slot) = field.name().and_then(MediaSlot::from_field) else {
                continue;
            };
            // Checked before the gate so a duplicate is never written
            if admitted.slot(slot).is_some() {
                return Err(AppError::validation(format!(
                    "Only one {} file is accepted per submission",
                    slot.as_str()
                )));
            }
            if let Some(stored) = admit_field(state, field, UploadKind::Any).await? {
                *admitted.slot_mut(slot) = Some(stored);
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = outcome {
        for filename in admitted.filenames() {
            discard(state, filename).await;
        }
        warn!(error = %e, "Media submission failed");
        drain(&mut multipart).await;
        return Err(e);
    }

    Ok(admitted)
}

/// Run one file field through the upload gate.
///
/// Returns `None` for an empty file input (no file selected in the form).
async fn admit_field(
    state: &AppState,
    field: Field<'_>,
    kind: UploadKind,
) -> Result<Option<StoredFile>> {
    let filename = field.file_name().unwrap_or("").to_string();
    if filename.is_empty() {
        return Ok(None);
    }

    let mime = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let declared_len = field
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());

    let request = UploadRequest::new(filename, mime, kind).with_declared_len(declared_len);
    state.gate.admit(request, field).await.map(Some)
}

/// Remove an admitted file that has to be given back
async fn discard(state: &AppState, filename: &str) {
    if let Err(e) = state.storage.remove_upload(filename).await {
        warn!(filename = %filename, error = %e, "Failed to discard upload");
    }
}

/// Read the rest of the body so the client sees the response instead of a
/// reset connection
async fn drain(multipart: &mut Multipart) {
    while let Ok(Some(_)) = multipart.next_field().await {}
}

fn content_kind(segment: &str) -> Result<ContentKind> {
    ContentKind::from_segment(segment)
        .ok_or_else(|| AppError::not_found(format!("Unknown content type: {}", segment)))
}

/// List the canonical upload directory
///
/// GET /admin/uploads
async fn list_uploads(State(state): State<AppState>) -> Result<Json<UploadListResponse>> {
    let uploads = state.storage.list_uploads().await?;

    Ok(Json(UploadListResponse {
        directory: state.storage.uploads_dir().display().to_string(),
        count: uploads.len(),
        uploads,
    }))
}

/// Upload listing response
#[derive(Debug, Serialize)]
pub struct UploadListResponse {
    pub directory: String,
    pub count: usize,
    pub uploads: Vec<UploadEntry>,
}

/// Create admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/uploads", get(list_uploads))
        .route("/uploads/{content}", post(submit_create))
        .route("/uploads/{content}/{id}", post(submit_edit))
        .route("/media/{kind}", post(upload_media))
}

use std::path::Path as FsPath;

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};
use uuid::Uuid;

use quill_core::content::extract_used_images;
use quill_types::api::{Claims, UploadImageResponse, UploadedFile};
use quill_types::models::ContentBlock;

use crate::auth::AppState;
use crate::error::into_status;

/// 2 MB upload limit for editor images
const MAX_IMAGE_SIZE: usize = 2_000_000;

/// Sniff the payload instead of trusting a client content type.
fn image_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpeg")
    } else if bytes.starts_with(b"GIF8") {
        Some("gif")
    } else {
        None
    }
}

fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// POST /me/stories/{story_id}/images — accepts raw image bytes, saves
/// under the upload dir, replies in the shape the block editor's image
/// tool expects: `{ "success": 1, "file": { "url": ... } }`.
pub async fn upload_image(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
    bytes: Bytes,
) -> Result<impl IntoResponse, StatusCode> {
    // Only a story's owner may attach images to it.
    state
        .stories
        .get_private_story(&story_id, &claims.sub.to_string())
        .await
        .map_err(into_status)?
        .ok_or(StatusCode::NOT_FOUND)?;

    if bytes.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }
    let ext = image_extension(&bytes).ok_or(StatusCode::UNSUPPORTED_MEDIA_TYPE)?;

    tokio::fs::create_dir_all(&state.upload_dir).await.map_err(|e| {
        error!("Failed to create upload directory: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let file_name = format!("{}.{}", Uuid::new_v4(), ext);
    let file_path = state.upload_dir.join(&file_name);
    let mut file = tokio::fs::File::create(&file_path).await.map_err(|e| {
        error!("Failed to create file {}: {}", file_path.display(), e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    file.write_all(&bytes).await.map_err(|e| {
        error!("Failed to write file {}: {}", file_path.display(), e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok((
        StatusCode::CREATED,
        Json(UploadImageResponse {
            success: 1,
            file: UploadedFile {
                url: format!("/images/{file_name}"),
            },
        }),
    ))
}

/// GET /images/{image} — serves an uploaded image.
pub async fn serve_image(
    State(state): State<AppState>,
    Path(image): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    // Upload names are uuid.ext; anything else is a traversal attempt.
    if !is_safe_file_name(&image) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let path = state.upload_dir.join(&image);
    let bytes = tokio::fs::read(&path).await.map_err(|_| StatusCode::NOT_FOUND)?;

    let content_type = match path.extension().and_then(|ext| ext.to_str()) {
        Some("png") => "image/png",
        Some("jpeg") | Some("jpg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    };

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// Delete files for images the previous draft referenced but the new
/// content no longer does. Best effort: a failed delete only leaves an
/// orphan file behind.
pub async fn prune_unused(
    upload_dir: &FsPath,
    old_content: &[ContentBlock],
    new_content: &[ContentBlock],
) {
    let still_used = extract_used_images(new_content);

    for stem in extract_used_images(old_content).difference(&still_used) {
        if !is_safe_file_name(stem) {
            continue;
        }
        for ext in ["png", "jpeg", "gif"] {
            let path = upload_dir.join(format!("{stem}.{ext}"));
            if tokio::fs::remove_file(&path).await.is_ok() {
                debug!("Pruned unreferenced image {}", path.display());
                break;
            }
        }
    }
}

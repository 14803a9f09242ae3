use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use quill_core::CommentDraft;
use quill_types::api::{Claims, CommentRequest};

use crate::auth::AppState;
use crate::error::into_status;

pub async fn list_comments(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    // Comments are public only where the story is.
    state
        .stories
        .get_public_story(&story_id)
        .await
        .map_err(into_status)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let comments = state
        .stories
        .list_comments_on(&story_id)
        .await
        .map_err(into_status)?;

    Ok(Json(comments))
}

/// Append a comment, then return the refreshed list so the panel can
/// re-render in one round trip.
pub async fn add_comment(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CommentRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let story = state
        .stories
        .get_public_story(&story_id)
        .await
        .map_err(into_status)?
        .ok_or(StatusCode::NOT_FOUND)?;

    story
        .comment(CommentDraft {
            author_id: claims.sub.to_string(),
            text: req.text,
        })
        .await
        .map_err(into_status)?;

    let comments = story.list_comments().await.map_err(into_status)?;
    Ok((StatusCode::CREATED, Json(comments)))
}

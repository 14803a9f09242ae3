use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use quill_types::api::Claims;

use crate::auth::AppState;
use crate::error::into_status;

/// Flip the signed-in viewer's clap on a published story and return the
/// new state, so the page can update its counter without a reload.
pub async fn toggle_clap(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let story = state
        .stories
        .get_public_story(&story_id)
        .await
        .map_err(into_status)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let info = story
        .toggle_clap(&claims.sub.to_string())
        .await
        .map_err(into_status)?;

    Ok(Json(info))
}

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::error;

use crate::auth::AppState;

/// Public author profile: user info plus their published stories.
pub async fn profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, StatusCode> {
    let profile = state
        .store
        .user_profile(&user_id)
        .await
        .map_err(|e| {
            error!("profile query failed: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(profile))
}

use axum::http::StatusCode;
use tracing::error;

use quill_core::StoryError;

/// Collapse a domain error onto the status the web contract promises:
/// `NotFound` → 404, `Validation` → 422, `Storage` → 500.
pub fn into_status(err: StoryError) -> StatusCode {
    match err {
        StoryError::NotFound => StatusCode::NOT_FOUND,
        StoryError::Validation(reason) => {
            tracing::debug!("rejected input: {reason}");
            StatusCode::UNPROCESSABLE_ENTITY
        }
        StoryError::Storage(e) => {
            error!("storage error: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

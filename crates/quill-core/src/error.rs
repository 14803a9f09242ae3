use thiserror::Error;

/// Failure taxonomy for story operations. The web layer maps these onto
/// status codes: `NotFound` → 404, `Validation` → 422, `Storage` → 500.
#[derive(Debug, Error)]
pub enum StoryError {
    /// The story does not exist, or exists but fails an ownership or
    /// visibility filter.
    #[error("story not found")]
    NotFound,

    /// Client input was rejected before any write happened.
    #[error("validation error: {0}")]
    Validation(String),

    /// The persistence port failed. Propagated unchanged — the core never
    /// retries storage failures.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StoryError>;

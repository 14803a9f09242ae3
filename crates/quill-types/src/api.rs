use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ContentBlock;

// -- JWT Claims --

/// JWT claims attached to every authenticated request. Canonical definition
/// lives here so quill-api's middleware and handlers share one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Stories --

#[derive(Debug, Serialize)]
pub struct CreateStoryResponse {
    pub story_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SaveStoryRequest {
    pub title: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
pub struct PublishStoryRequest {
    pub title: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    #[serde(default = "default_count")]
    pub count: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_count() -> i64 {
    10
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentRequest {
    pub text: String,
}

// -- Images --

/// Upload reply in the shape the block editor's image tool expects.
#[derive(Debug, Serialize)]
pub struct UploadImageResponse {
    pub success: u8,
    pub file: UploadedFile,
}

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub url: String,
}

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::error;

use quill_core::{DraftEdits, PublishEdits, Story, content};
use quill_types::api::{
    Claims, CreateStoryResponse, FeedQuery, PublishStoryRequest, SaveStoryRequest,
};
use quill_types::models::{FeedStory, StoryListing};

use crate::auth::AppState;
use crate::error::into_status;
use crate::images;

/// Resolve a story scoped to its owner, or 404. Every mutation handler
/// comes through here before touching the story.
async fn resolve_own_story(
    state: &AppState,
    story_id: &str,
    claims: &Claims,
) -> Result<Story, StatusCode> {
    state
        .stories
        .get_private_story(story_id, &claims.sub.to_string())
        .await
        .map_err(into_status)?
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn create_story(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let story_id = state
        .stories
        .create_story(&claims.sub.to_string())
        .await
        .map_err(into_status)?;

    Ok((StatusCode::CREATED, Json(CreateStoryResponse { story_id })))
}

/// The owner's editor view of a story, any state.
pub async fn editor_story(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let story = resolve_own_story(&state, &story_id, &claims).await?;
    let record = story.fetch().await.map_err(into_status)?;
    Ok(Json(record))
}

pub async fn save_story(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SaveStoryRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let story = resolve_own_story(&state, &story_id, &claims).await?;

    // Images dropped from the draft are unreferenced from here on; remove
    // their files before the old content is overwritten.
    let previous = story.fetch().await.map_err(into_status)?;
    images::prune_unused(&state.upload_dir, &previous.content, &req.content).await;

    story
        .save(DraftEdits {
            title: req.title,
            content: req.content,
            author_id: claims.sub.to_string(),
        })
        .await
        .map_err(into_status)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn publish_story(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PublishStoryRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let story = resolve_own_story(&state, &story_id, &claims).await?;

    // Sanitize the raw tag input from the editor form; the entity still
    // enforces the publish invariants on what remains.
    let tags = content::validate_tags(&req.tags);

    story
        .publish(PublishEdits {
            title: req.title,
            content: req.content,
            tags,
            author_id: claims.sub.to_string(),
        })
        .await
        .map_err(into_status)?;

    Ok(Json(serde_json::json!({ "story_id": story.id() })))
}

#[derive(Serialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub story: FeedStory,
    pub claps_count: i64,
}

/// Recent published stories for the dashboard, clap counts included.
pub async fn feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let count = if query.count < 0 { -1 } else { query.count.min(100) };

    let stories = state
        .stories
        .get(count, query.offset.max(0))
        .await
        .map_err(into_status)?;

    let mut items = Vec::with_capacity(stories.len());
    for story in stories {
        let claps_count = state.claps.count(&story.id).await.map_err(into_status)?;
        items.push(FeedItem { story, claps_count });
    }

    Ok(Json(items))
}

/// Public story page. A valid bearer token personalizes `is_clapped`;
/// anonymous viewers get the bare counts.
pub async fn story_page(
    State(state): State<AppState>,
    Path(story_id): Path<String>,
    claims: Option<Extension<Claims>>,
) -> Result<impl IntoResponse, StatusCode> {
    let story = state
        .stories
        .get_public_story(&story_id)
        .await
        .map_err(into_status)?
        .ok_or(StatusCode::NOT_FOUND)?;

    let viewer = claims.as_ref().map(|Extension(c)| c.sub.to_string());
    let page = story.page(viewer.as_deref()).await.map_err(into_status)?;

    Ok(Json(page))
}

#[derive(Serialize)]
pub struct MyStories {
    pub published: Vec<StoryListing>,
    pub drafted: Vec<StoryListing>,
}

/// The signed-in author's own stories, split by state.
pub async fn my_stories(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, StatusCode> {
    let author = claims.sub.to_string();

    let published = state
        .store
        .user_story_listings(&author, "published")
        .await
        .map_err(|e| {
            error!("story listing query failed: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let drafted = state
        .store
        .user_story_listings(&author, "drafted")
        .await
        .map_err(|e| {
            error!("story listing query failed: {e:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(MyStories { published, drafted }))
}

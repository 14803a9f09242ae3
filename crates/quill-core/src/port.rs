use async_trait::async_trait;

use quill_types::models::{
    ClapInfo, Comment, ContentBlock, FeedStory, PublishedStory, StoryRecord, StoryState,
};

/// Full story body for a single update write. `last_modified` is set by the
/// store on every write, never by the caller.
#[derive(Debug, Clone)]
pub struct StoryUpdate {
    pub author_id: String,
    pub title: String,
    pub content: Vec<ContentBlock>,
    pub state: StoryState,
    pub cover_image: Option<String>,
}

/// Persistence contract for stories, tags, claps and comments.
///
/// Every call is a suspension point. Absence is `Ok(None)` — stores never
/// error for an ordinary miss. Failures surface as `anyhow::Error` and are
/// propagated unchanged by the core.
#[async_trait]
pub trait StoryStore: Send + Sync {
    // Stories
    async fn create_story(&self, author_id: &str) -> anyhow::Result<String>;
    async fn story(&self, story_id: &str) -> anyhow::Result<Option<StoryRecord>>;
    async fn story_of_user(
        &self,
        story_id: &str,
        author_id: &str,
    ) -> anyhow::Result<Option<StoryRecord>>;
    async fn published_story(&self, story_id: &str) -> anyhow::Result<Option<PublishedStory>>;
    async fn latest_stories(&self, count: i64, offset: i64) -> anyhow::Result<Vec<FeedStory>>;
    /// Keyed by (story, author); sets `last_modified` server-side.
    async fn update_story(&self, story_id: &str, update: StoryUpdate) -> anyhow::Result<()>;

    // Tags
    async fn delete_tags(&self, story_id: &str) -> anyhow::Result<()>;
    async fn add_tag(&self, story_id: &str, tag: &str) -> anyhow::Result<()>;

    // Claps
    async fn clap_info(&self, story_id: &str, user_id: &str) -> anyhow::Result<ClapInfo>;
    async fn add_clap(&self, story_id: &str, user_id: &str) -> anyhow::Result<()>;
    async fn remove_clap(&self, story_id: &str, user_id: &str) -> anyhow::Result<()>;
    async fn clap_count(&self, story_id: &str) -> anyhow::Result<i64>;

    // Comments
    async fn comments_on(&self, story_id: &str) -> anyhow::Result<Vec<Comment>>;
    /// Returns the new comment's id.
    async fn add_comment(&self, story_id: &str, author_id: &str, text: &str)
    -> anyhow::Result<String>;
}

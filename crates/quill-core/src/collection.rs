use std::sync::Arc;

use tracing::debug;

use quill_types::models::{Comment, FeedStory};

use crate::error::Result;
use crate::port::StoryStore;
use crate::story::Story;

/// Creates stories and resolves them into [`Story`] entities. Resolution is
/// the authorization boundary: private lookups require the owner, public
/// lookups require published state, and a miss is `None`, never an error.
pub struct StoryCollection {
    store: Arc<dyn StoryStore>,
}

impl StoryCollection {
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self { store }
    }

    /// A brand-new drafted story owned by `author_id`, with placeholder
    /// title and empty content. Returns the server-assigned id.
    pub async fn create_story(&self, author_id: &str) -> Result<String> {
        let id = self.store.create_story(author_id).await?;
        debug!(story = %id, author = %author_id, "created story");
        Ok(id)
    }

    /// Resolve a story only if it exists AND is owned by `author_id`, in
    /// any state. Callers acting on behalf of a user must come through
    /// here — this is the sole ownership check.
    pub async fn get_private_story(
        &self,
        story_id: &str,
        author_id: &str,
    ) -> Result<Option<Story>> {
        let found = self.store.story_of_user(story_id, author_id).await?;
        Ok(found.map(|record| Story::new(Arc::clone(&self.store), record.id)))
    }

    /// Resolve a story only if it exists and is published; drafts are
    /// invisible here regardless of who asks.
    pub async fn get_public_story(&self, story_id: &str) -> Result<Option<Story>> {
        let found = self.store.published_story(story_id).await?;
        Ok(found.map(|story| Story::new(Arc::clone(&self.store), story.id)))
    }

    /// The `count` most recently modified published stories starting at
    /// `offset`, newest first, content parsed. `count = -1` means all.
    pub async fn get(&self, count: i64, offset: i64) -> Result<Vec<FeedStory>> {
        Ok(self.store.latest_stories(count, offset).await?)
    }

    /// Comment listing without resolving a full entity, for anonymous
    /// story-page requests.
    pub async fn list_comments_on(&self, story_id: &str) -> Result<Vec<Comment>> {
        Ok(self.store.comments_on(story_id).await?)
    }
}

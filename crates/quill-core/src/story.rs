use std::sync::Arc;

use tracing::debug;

use quill_types::models::{ClapInfo, Comment, ContentBlock, StoryPage, StoryRecord, StoryState};

use crate::claps::ClapLedger;
use crate::content;
use crate::error::{Result, StoryError};
use crate::port::{StoryStore, StoryUpdate};

/// Title substituted when a draft is saved without one.
pub const UNTITLED: &str = "Untitled Story";

/// Edits applied by a draft save.
#[derive(Debug, Clone)]
pub struct DraftEdits {
    pub title: String,
    pub content: Vec<ContentBlock>,
    pub author_id: String,
}

/// Edits applied by a publish.
#[derive(Debug, Clone)]
pub struct PublishEdits {
    pub title: String,
    pub content: Vec<ContentBlock>,
    pub tags: Vec<String>,
    pub author_id: String,
}

#[derive(Debug, Clone)]
pub struct CommentDraft {
    pub author_id: String,
    pub text: String,
}

/// One addressable story. Carries no row data between calls — every
/// operation is a fresh round trip through the persistence port. Resolved
/// through [`StoryCollection`](crate::collection::StoryCollection), which is
/// where ownership and visibility are enforced.
pub struct Story {
    store: Arc<dyn StoryStore>,
    id: String,
}

impl Story {
    pub(crate) fn new(store: Arc<dyn StoryStore>, id: String) -> Self {
        Self { store, id }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Save as draft. A blank title becomes [`UNTITLED`]; the state is
    /// forced back to drafted and any previously derived cover image is
    /// cleared. One write, no retry.
    pub async fn save(&self, edits: DraftEdits) -> Result<()> {
        let trimmed = edits.title.trim();
        let title = if trimmed.is_empty() {
            UNTITLED.to_string()
        } else {
            trimmed.to_string()
        };

        self.store
            .update_story(
                &self.id,
                StoryUpdate {
                    author_id: edits.author_id,
                    title,
                    content: edits.content,
                    state: StoryState::Drafted,
                    cover_image: None,
                },
            )
            .await?;
        Ok(())
    }

    /// Publish. Validation happens on in-memory data before any write, so
    /// an invalid publish performs zero writes. The body write strictly
    /// precedes tag replacement; the two are not atomic — a crash in
    /// between leaves the story published with stale tags, and the recovery
    /// path is simply publishing again.
    pub async fn publish(&self, edits: PublishEdits) -> Result<()> {
        let title = edits.title.trim().to_string();

        if !content::is_publishable(&title, &edits.tags) {
            return Err(StoryError::Validation(
                "a story needs a title and at most 5 tags to be published".into(),
            ));
        }
        if let Some(tag) = edits.tags.iter().find(|tag| !content::is_valid_tag(tag)) {
            return Err(StoryError::Validation(format!(
                "tag {tag:?} is empty or longer than {} characters",
                content::MAX_TAG_LENGTH
            )));
        }

        let cover_image = content::find_cover_image(&edits.content);
        debug!(story = %self.id, cover = ?cover_image, "publishing story");

        self.store
            .update_story(
                &self.id,
                StoryUpdate {
                    author_id: edits.author_id,
                    title,
                    content: edits.content,
                    state: StoryState::Published,
                    cover_image,
                },
            )
            .await?;

        // Tags are fully replaced on every publish, never diffed.
        self.store.delete_tags(&self.id).await?;
        for tag in &edits.tags {
            self.store.add_tag(&self.id, tag).await?;
        }

        Ok(())
    }

    /// Flip this viewer's clap and return the new state. See
    /// [`ClapLedger::toggle`] for the concurrency caveat.
    pub async fn toggle_clap(&self, user_id: &str) -> Result<ClapInfo> {
        ClapLedger::new(Arc::clone(&self.store))
            .toggle(&self.id, user_id)
            .await
    }

    pub async fn list_comments(&self) -> Result<Vec<Comment>> {
        Ok(self.store.comments_on(&self.id).await?)
    }

    /// Append a comment and return the story id so the caller can re-render
    /// the comment list immediately.
    pub async fn comment(&self, draft: CommentDraft) -> Result<String> {
        if draft.text.trim().is_empty() {
            return Err(StoryError::Validation("a comment needs text".into()));
        }
        if draft.author_id.is_empty() {
            return Err(StoryError::Validation("a comment needs an author".into()));
        }

        self.store
            .add_comment(&self.id, &draft.author_id, &draft.text)
            .await?;
        Ok(self.id.clone())
    }

    /// The reader-facing story page: published body, tags, clap count, and
    /// the viewer's own clap state (`false` for anonymous viewers).
    pub async fn page(&self, viewer: Option<&str>) -> Result<StoryPage> {
        let story = self
            .store
            .published_story(&self.id)
            .await?
            .ok_or(StoryError::NotFound)?;

        let claps = match viewer {
            Some(user_id) => self.store.clap_info(&self.id, user_id).await?,
            None => ClapInfo {
                is_clapped: false,
                claps_count: self.store.clap_count(&self.id).await?,
            },
        };

        Ok(StoryPage {
            story,
            claps_count: claps.claps_count,
            is_clapped: claps.is_clapped,
        })
    }

    /// The raw record for editor rendering and upload bookkeeping.
    /// Ownership was already enforced when this entity was resolved.
    pub async fn fetch(&self) -> Result<StoryRecord> {
        self.store.story(&self.id).await?.ok_or(StoryError::NotFound)
    }
}

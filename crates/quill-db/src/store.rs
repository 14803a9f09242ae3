use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use quill_core::port::{StoryStore, StoryUpdate};
use quill_types::models::{
    ClapInfo, Comment, ContentBlock, FeedStory, ProfileStory, PublishedStory, StoryListing,
    StoryRecord, StoryState, UserProfile,
};

use crate::Database;
use crate::models::{CommentRow, FeedStoryRow, PublishedStoryRow, StoryRow};

/// Persistence-port adapter over [`Database`]. rusqlite is blocking, so
/// every call runs the query on the blocking pool, keeping the async
/// runtime free while SQLite works.
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// A user's drafted or published story listings, newest first. Outside
    /// the core port — only the dashboard pages need it.
    pub async fn user_story_listings(
        &self,
        author_id: &str,
        state: &str,
    ) -> anyhow::Result<Vec<StoryListing>> {
        let db = Arc::clone(&self.db);
        let author = author_id.to_string();
        let state = state.to_string();
        let rows =
            tokio::task::spawn_blocking(move || db.get_user_stories(&author, &state)).await??;
        Ok(rows
            .into_iter()
            .map(|row| StoryListing {
                last_modified: parse_timestamp(&row.id, &row.last_modified),
                id: row.id,
                title: row.title,
            })
            .collect())
    }

    /// Public profile: the user plus their published stories.
    pub async fn user_profile(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>> {
        let db = Arc::clone(&self.db);
        let id = user_id.to_string();
        let found = tokio::task::spawn_blocking(move || {
            let Some(user) = db.get_user_by_id(&id)? else {
                return Ok(None);
            };
            let stories = db.get_profile_stories(&id)?;
            Ok::<_, anyhow::Error>(Some((user, stories)))
        })
        .await??;

        Ok(found.map(|(user, stories)| UserProfile {
            id: user.id,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            bio: user.bio,
            stories: stories
                .into_iter()
                .map(|row| ProfileStory {
                    content: parse_content(&row.id, &row.content),
                    last_modified: parse_timestamp(&row.id, &row.last_modified),
                    id: row.id,
                    title: row.title,
                    cover_image: row.cover_image,
                })
                .collect(),
        }))
    }
}

#[async_trait]
impl StoryStore for SqliteStore {
    async fn create_story(&self, author_id: &str) -> anyhow::Result<String> {
        let db = Arc::clone(&self.db);
        let id = Uuid::new_v4().to_string();
        let story_id = id.clone();
        let author = author_id.to_string();
        tokio::task::spawn_blocking(move || db.create_story(&story_id, &author)).await??;
        Ok(id)
    }

    async fn story(&self, story_id: &str) -> anyhow::Result<Option<StoryRecord>> {
        let db = Arc::clone(&self.db);
        let id = story_id.to_string();
        let row = tokio::task::spawn_blocking(move || db.get_story(&id)).await??;
        Ok(row.map(record_from_row))
    }

    async fn story_of_user(
        &self,
        story_id: &str,
        author_id: &str,
    ) -> anyhow::Result<Option<StoryRecord>> {
        let db = Arc::clone(&self.db);
        let id = story_id.to_string();
        let author = author_id.to_string();
        let row =
            tokio::task::spawn_blocking(move || db.get_story_of_user(&id, &author)).await??;
        Ok(row.map(record_from_row))
    }

    async fn published_story(&self, story_id: &str) -> anyhow::Result<Option<PublishedStory>> {
        let db = Arc::clone(&self.db);
        let id = story_id.to_string();
        let row = tokio::task::spawn_blocking(move || db.get_published_story(&id)).await??;
        Ok(row.map(published_from_row))
    }

    async fn latest_stories(&self, count: i64, offset: i64) -> anyhow::Result<Vec<FeedStory>> {
        let db = Arc::clone(&self.db);
        let rows =
            tokio::task::spawn_blocking(move || db.get_latest_stories(count, offset)).await??;
        Ok(rows.into_iter().map(feed_from_row).collect())
    }

    async fn update_story(&self, story_id: &str, update: StoryUpdate) -> anyhow::Result<()> {
        let db = Arc::clone(&self.db);
        let id = story_id.to_string();
        let content = serde_json::to_string(&update.content)?;
        tokio::task::spawn_blocking(move || {
            db.update_story(
                &id,
                &update.author_id,
                &update.title,
                &content,
                update.state.as_str(),
                update.cover_image.as_deref(),
            )
        })
        .await??;
        Ok(())
    }

    async fn delete_tags(&self, story_id: &str) -> anyhow::Result<()> {
        let db = Arc::clone(&self.db);
        let id = story_id.to_string();
        tokio::task::spawn_blocking(move || db.delete_tags(&id)).await??;
        Ok(())
    }

    async fn add_tag(&self, story_id: &str, tag: &str) -> anyhow::Result<()> {
        let db = Arc::clone(&self.db);
        let id = story_id.to_string();
        let tag = tag.to_string();
        tokio::task::spawn_blocking(move || db.add_tag(&id, &tag)).await??;
        Ok(())
    }

    async fn clap_info(&self, story_id: &str, user_id: &str) -> anyhow::Result<ClapInfo> {
        let db = Arc::clone(&self.db);
        let id = story_id.to_string();
        let user = user_id.to_string();
        let (is_clapped, claps_count) =
            tokio::task::spawn_blocking(move || db.get_clap_info(&id, &user)).await??;
        Ok(ClapInfo {
            is_clapped,
            claps_count,
        })
    }

    async fn add_clap(&self, story_id: &str, user_id: &str) -> anyhow::Result<()> {
        let db = Arc::clone(&self.db);
        let id = story_id.to_string();
        let user = user_id.to_string();
        tokio::task::spawn_blocking(move || db.add_clap(&id, &user)).await??;
        Ok(())
    }

    async fn remove_clap(&self, story_id: &str, user_id: &str) -> anyhow::Result<()> {
        let db = Arc::clone(&self.db);
        let id = story_id.to_string();
        let user = user_id.to_string();
        tokio::task::spawn_blocking(move || db.remove_clap(&id, &user)).await??;
        Ok(())
    }

    async fn clap_count(&self, story_id: &str) -> anyhow::Result<i64> {
        let db = Arc::clone(&self.db);
        let id = story_id.to_string();
        Ok(tokio::task::spawn_blocking(move || db.clap_count(&id)).await??)
    }

    async fn comments_on(&self, story_id: &str) -> anyhow::Result<Vec<Comment>> {
        let db = Arc::clone(&self.db);
        let id = story_id.to_string();
        let rows = tokio::task::spawn_blocking(move || db.list_comments(&id)).await??;
        Ok(rows.into_iter().map(comment_from_row).collect())
    }

    async fn add_comment(
        &self,
        story_id: &str,
        author_id: &str,
        text: &str,
    ) -> anyhow::Result<String> {
        let db = Arc::clone(&self.db);
        let comment_id = Uuid::new_v4().to_string();
        let cid = comment_id.clone();
        let sid = story_id.to_string();
        let author = author_id.to_string();
        let text = text.to_string();
        tokio::task::spawn_blocking(move || db.add_comment(&cid, &sid, &author, &text)).await??;
        Ok(comment_id)
    }
}

// -- Row conversions --

fn parse_content(story_id: &str, raw: &str) -> Vec<ContentBlock> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Corrupt content on story '{}': {}", story_id, e);
        vec![]
    })
}

fn parse_timestamp(story_id: &str, raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') stores "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on story '{}': {}", raw, story_id, e);
            DateTime::default()
        })
}

fn parse_state(story_id: &str, raw: &str) -> StoryState {
    StoryState::parse(raw).unwrap_or_else(|| {
        warn!("Corrupt state '{}' on story '{}'", raw, story_id);
        StoryState::Drafted
    })
}

fn record_from_row(row: StoryRow) -> StoryRecord {
    StoryRecord {
        content: parse_content(&row.id, &row.content),
        state: parse_state(&row.id, &row.state),
        last_modified: parse_timestamp(&row.id, &row.last_modified),
        id: row.id,
        author_id: row.written_by,
        title: row.title,
        cover_image: row.cover_image,
    }
}

fn published_from_row(row: PublishedStoryRow) -> PublishedStory {
    PublishedStory {
        content: parse_content(&row.id, &row.content),
        last_modified: parse_timestamp(&row.id, &row.last_modified),
        tags: row
            .tags
            .map(|csv| csv.split(',').map(str::to_string).collect())
            .unwrap_or_default(),
        id: row.id,
        title: row.title,
        author_id: row.author_id,
        author_name: row.author_name,
        author_avatar: row.author_avatar,
    }
}

fn feed_from_row(row: FeedStoryRow) -> FeedStory {
    FeedStory {
        content: parse_content(&row.id, &row.content),
        last_modified: parse_timestamp(&row.id, &row.last_modified),
        id: row.id,
        title: row.title,
        cover_image: row.cover_image,
        author_id: row.author_id,
        author_name: row.author_name,
    }
}

fn comment_from_row(row: CommentRow) -> Comment {
    Comment {
        commented_at: parse_timestamp(&row.story_id, &row.commented_at),
        story_id: row.story_id,
        author_id: row.author_id,
        author_name: row.author_name,
        text: row.text,
    }
}

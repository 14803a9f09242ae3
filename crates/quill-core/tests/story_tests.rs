//! Story entity / collection semantics against an in-memory store that
//! records every write, so the no-write-on-invalid-publish property is
//! observable.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use quill_core::{
    CommentDraft, DraftEdits, PublishEdits, StoryCollection, StoryError, StoryStore, StoryUpdate,
};
use quill_types::models::{
    ClapInfo, Comment, ContentBlock, FeedStory, PublishedStory, StoryRecord, StoryState,
};

#[derive(Default)]
struct MemState {
    stories: HashMap<String, StoryRecord>,
    tags: Vec<(String, String)>,
    claps: HashSet<(String, String)>,
    comments: Vec<Comment>,
    writes: Vec<&'static str>,
    clock: i64,
    next_id: u64,
}

impl MemState {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        DateTime::from_timestamp(1_600_000_000 + self.clock, 0).unwrap()
    }
}

#[derive(Default)]
struct MemStore {
    state: Mutex<MemState>,
}

impl MemStore {
    fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes.len()
    }

    fn record(&self, story_id: &str) -> StoryRecord {
        self.state.lock().unwrap().stories[story_id].clone()
    }

    fn tags_for(&self, story_id: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .tags
            .iter()
            .filter(|(id, _)| id == story_id)
            .map(|(_, tag)| tag.clone())
            .collect()
    }
}

#[async_trait]
impl StoryStore for MemStore {
    async fn create_story(&self, author_id: &str) -> anyhow::Result<String> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("story-{}", state.next_id);
        let last_modified = state.tick();
        state.stories.insert(
            id.clone(),
            StoryRecord {
                id: id.clone(),
                author_id: author_id.to_string(),
                title: String::new(),
                content: vec![],
                state: StoryState::Drafted,
                cover_image: None,
                last_modified,
            },
        );
        state.writes.push("create_story");
        Ok(id)
    }

    async fn story(&self, story_id: &str) -> anyhow::Result<Option<StoryRecord>> {
        Ok(self.state.lock().unwrap().stories.get(story_id).cloned())
    }

    async fn story_of_user(
        &self,
        story_id: &str,
        author_id: &str,
    ) -> anyhow::Result<Option<StoryRecord>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .stories
            .get(story_id)
            .filter(|record| record.author_id == author_id)
            .cloned())
    }

    async fn published_story(&self, story_id: &str) -> anyhow::Result<Option<PublishedStory>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .stories
            .get(story_id)
            .filter(|record| record.state == StoryState::Published)
            .map(|record| PublishedStory {
                id: record.id.clone(),
                title: record.title.clone(),
                content: record.content.clone(),
                author_id: record.author_id.clone(),
                author_name: record.author_id.clone(),
                author_avatar: None,
                tags: state
                    .tags
                    .iter()
                    .filter(|(id, _)| id == story_id)
                    .map(|(_, tag)| tag.clone())
                    .collect(),
                last_modified: record.last_modified,
            }))
    }

    async fn latest_stories(&self, count: i64, offset: i64) -> anyhow::Result<Vec<FeedStory>> {
        let state = self.state.lock().unwrap();
        let mut published: Vec<&StoryRecord> = state
            .stories
            .values()
            .filter(|record| record.state == StoryState::Published)
            .collect();
        published.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

        let limit = if count < 0 { usize::MAX } else { count as usize };
        Ok(published
            .into_iter()
            .skip(offset as usize)
            .take(limit)
            .map(|record| FeedStory {
                id: record.id.clone(),
                title: record.title.clone(),
                content: record.content.clone(),
                cover_image: record.cover_image.clone(),
                author_id: record.author_id.clone(),
                author_name: record.author_id.clone(),
                last_modified: record.last_modified,
            })
            .collect())
    }

    async fn update_story(&self, story_id: &str, update: StoryUpdate) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        let last_modified = state.tick();
        if let Some(record) = state.stories.get_mut(story_id) {
            if record.author_id == update.author_id {
                record.title = update.title;
                record.content = update.content;
                record.state = update.state;
                record.cover_image = update.cover_image;
                record.last_modified = last_modified;
            }
        }
        state.writes.push("update_story");
        Ok(())
    }

    async fn delete_tags(&self, story_id: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.tags.retain(|(id, _)| id != story_id);
        state.writes.push("delete_tags");
        Ok(())
    }

    async fn add_tag(&self, story_id: &str, tag: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.tags.push((story_id.to_string(), tag.to_string()));
        state.writes.push("add_tag");
        Ok(())
    }

    async fn clap_info(&self, story_id: &str, user_id: &str) -> anyhow::Result<ClapInfo> {
        let state = self.state.lock().unwrap();
        Ok(ClapInfo {
            is_clapped: state
                .claps
                .contains(&(story_id.to_string(), user_id.to_string())),
            claps_count: state.claps.iter().filter(|(id, _)| id == story_id).count() as i64,
        })
    }

    async fn add_clap(&self, story_id: &str, user_id: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .claps
            .insert((story_id.to_string(), user_id.to_string()));
        state.writes.push("add_clap");
        Ok(())
    }

    async fn remove_clap(&self, story_id: &str, user_id: &str) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .claps
            .remove(&(story_id.to_string(), user_id.to_string()));
        state.writes.push("remove_clap");
        Ok(())
    }

    async fn clap_count(&self, story_id: &str) -> anyhow::Result<i64> {
        let state = self.state.lock().unwrap();
        Ok(state.claps.iter().filter(|(id, _)| id == story_id).count() as i64)
    }

    async fn comments_on(&self, story_id: &str) -> anyhow::Result<Vec<Comment>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .comments
            .iter()
            .filter(|comment| comment.story_id == story_id)
            .cloned()
            .collect())
    }

    async fn add_comment(
        &self,
        story_id: &str,
        author_id: &str,
        text: &str,
    ) -> anyhow::Result<String> {
        let mut state = self.state.lock().unwrap();
        let commented_at = state.tick();
        state.comments.push(Comment {
            story_id: story_id.to_string(),
            author_id: author_id.to_string(),
            author_name: author_id.to_string(),
            text: text.to_string(),
            commented_at,
        });
        state.writes.push("add_comment");
        Ok(format!("comment-{}", state.comments.len()))
    }
}

fn setup() -> (Arc<MemStore>, StoryCollection) {
    let store = Arc::new(MemStore::default());
    let collection = StoryCollection::new(store.clone() as Arc<dyn StoryStore>);
    (store, collection)
}

fn image(url: &str) -> ContentBlock {
    ContentBlock {
        kind: "image".into(),
        data: json!({ "file": { "url": url } }),
    }
}

fn paragraph(text: &str) -> ContentBlock {
    ContentBlock {
        kind: "paragraph".into(),
        data: json!({ "text": text }),
    }
}

fn draft(title: &str, author: &str) -> DraftEdits {
    DraftEdits {
        title: title.into(),
        content: vec![],
        author_id: author.into(),
    }
}

fn publishable(title: &str, content: Vec<ContentBlock>, tags: &[&str], author: &str) -> PublishEdits {
    PublishEdits {
        title: title.into(),
        content,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        author_id: author.into(),
    }
}

async fn create_resolved(
    collection: &StoryCollection,
    author: &str,
) -> (String, quill_core::Story) {
    let id = collection.create_story(author).await.unwrap();
    let story = collection
        .get_private_story(&id, author)
        .await
        .unwrap()
        .expect("owner resolves own story");
    (id, story)
}

#[tokio::test]
async fn save_substitutes_default_title_for_blank() {
    let (store, collection) = setup();
    let (id, story) = create_resolved(&collection, "alice").await;

    story.save(draft("   ", "alice")).await.unwrap();

    let record = store.record(&id);
    assert_eq!(record.title, "Untitled Story");
    assert_eq!(record.state, StoryState::Drafted);
}

#[tokio::test]
async fn save_trims_title() {
    let (store, collection) = setup();
    let (id, story) = create_resolved(&collection, "alice").await;

    story.save(draft(" My Post ", "alice")).await.unwrap();

    assert_eq!(store.record(&id).title, "My Post");
}

#[tokio::test]
async fn save_clears_cover_and_forces_draft() {
    let (store, collection) = setup();
    let (id, story) = create_resolved(&collection, "alice").await;

    story
        .publish(publishable("T", vec![image("cover.png")], &["tag"], "alice"))
        .await
        .unwrap();
    assert_eq!(store.record(&id).cover_image.as_deref(), Some("cover.png"));

    story.save(draft("T", "alice")).await.unwrap();

    let record = store.record(&id);
    assert_eq!(record.cover_image, None);
    assert_eq!(record.state, StoryState::Drafted);
}

#[tokio::test]
async fn invalid_publish_performs_zero_writes() {
    let (store, collection) = setup();
    let (_, story) = create_resolved(&collection, "alice").await;
    let baseline = store.write_count();

    let err = story
        .publish(publishable("   ", vec![], &[], "alice"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoryError::Validation(_)));
    assert_eq!(store.write_count(), baseline);
}

#[tokio::test]
async fn publish_rejects_six_tags() {
    let (_, collection) = setup();
    let (_, story) = create_resolved(&collection, "alice").await;

    let err = story
        .publish(publishable("T", vec![], &["a", "b", "c", "d", "e", "f"], "alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoryError::Validation(_)));
}

#[tokio::test]
async fn publish_rejects_overlong_tag() {
    let (_, collection) = setup();
    let (_, story) = create_resolved(&collection, "alice").await;

    let long = "a".repeat(26);
    let err = story
        .publish(publishable("T", vec![], &[long.as_str()], "alice"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoryError::Validation(_)));
}

#[tokio::test]
async fn publish_accepts_boundary_tag() {
    let (store, collection) = setup();
    let (id, story) = create_resolved(&collection, "alice").await;

    let edge = "a".repeat(25);
    story
        .publish(publishable("T", vec![], &[edge.as_str()], "alice"))
        .await
        .unwrap();

    assert_eq!(store.record(&id).state, StoryState::Published);
    assert_eq!(store.tags_for(&id), vec![edge]);
}

#[tokio::test]
async fn publish_derives_cover_from_first_image() {
    let (store, collection) = setup();
    let (id, story) = create_resolved(&collection, "alice").await;

    let content = vec![paragraph("intro"), image("img1"), image("img2")];
    story
        .publish(publishable("T", content, &[], "alice"))
        .await
        .unwrap();

    assert_eq!(store.record(&id).cover_image.as_deref(), Some("img1"));
}

#[tokio::test]
async fn publish_without_image_has_no_cover() {
    let (store, collection) = setup();
    let (id, story) = create_resolved(&collection, "alice").await;

    story
        .publish(publishable("T", vec![paragraph("text")], &[], "alice"))
        .await
        .unwrap();

    assert_eq!(store.record(&id).cover_image, None);
}

#[tokio::test]
async fn republish_fully_replaces_tags() {
    let (store, collection) = setup();
    let (id, story) = create_resolved(&collection, "alice").await;

    story
        .publish(publishable("T", vec![], &["a", "b"], "alice"))
        .await
        .unwrap();
    assert_eq!(store.tags_for(&id), vec!["a", "b"]);

    story
        .publish(publishable("T", vec![], &["c"], "alice"))
        .await
        .unwrap();
    assert_eq!(store.tags_for(&id), vec!["c"]);
}

#[tokio::test]
async fn toggle_clap_is_self_inverse() {
    let (_, collection) = setup();
    let (id, story) = create_resolved(&collection, "alice").await;
    story
        .publish(publishable("T", vec![], &[], "alice"))
        .await
        .unwrap();
    let reader = collection.get_public_story(&id).await.unwrap().unwrap();

    let first = reader.toggle_clap("bob").await.unwrap();
    assert_eq!(
        first,
        ClapInfo {
            is_clapped: true,
            claps_count: 1
        }
    );

    let second = reader.toggle_clap("bob").await.unwrap();
    assert_eq!(
        second,
        ClapInfo {
            is_clapped: false,
            claps_count: 0
        }
    );
}

#[tokio::test]
async fn claps_from_different_users_are_independent() {
    let (_, collection) = setup();
    let (id, story) = create_resolved(&collection, "alice").await;
    story
        .publish(publishable("T", vec![], &[], "alice"))
        .await
        .unwrap();
    let reader = collection.get_public_story(&id).await.unwrap().unwrap();

    reader.toggle_clap("bob").await.unwrap();
    let info = reader.toggle_clap("carol").await.unwrap();
    assert_eq!(
        info,
        ClapInfo {
            is_clapped: true,
            claps_count: 2
        }
    );
}

#[tokio::test]
async fn comment_rejects_blank_text() {
    let (_, collection) = setup();
    let (_, story) = create_resolved(&collection, "alice").await;

    let err = story
        .comment(CommentDraft {
            author_id: "bob".into(),
            text: "   ".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoryError::Validation(_)));
}

#[tokio::test]
async fn comment_appends_and_returns_story_id() {
    let (_, collection) = setup();
    let (id, story) = create_resolved(&collection, "alice").await;

    let before = story.list_comments().await.unwrap().len();
    let returned = story
        .comment(CommentDraft {
            author_id: "bob".into(),
            text: "hi".into(),
        })
        .await
        .unwrap();

    assert_eq!(returned, id);
    let after = story.list_comments().await.unwrap();
    assert_eq!(after.len(), before + 1);
    assert_eq!(after.last().unwrap().text, "hi");
}

#[tokio::test]
async fn private_lookup_enforces_ownership() {
    let (_, collection) = setup();
    let (id, _) = create_resolved(&collection, "bob").await;

    assert!(collection.get_private_story(&id, "alice").await.unwrap().is_none());
    assert!(collection.get_private_story(&id, "bob").await.unwrap().is_some());
    assert!(collection
        .get_private_story("missing", "bob")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn public_lookup_hides_drafts() {
    let (_, collection) = setup();
    let (id, story) = create_resolved(&collection, "alice").await;

    assert!(collection.get_public_story(&id).await.unwrap().is_none());

    story
        .publish(publishable("T", vec![], &[], "alice"))
        .await
        .unwrap();
    assert!(collection.get_public_story(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn feed_lists_recent_published_with_paging() {
    let (_, collection) = setup();

    for n in 0..4 {
        let (_, story) = create_resolved(&collection, "alice").await;
        story
            .publish(publishable(&format!("story {n}"), vec![], &[], "alice"))
            .await
            .unwrap();
    }
    // A draft must never surface in the feed.
    create_resolved(&collection, "alice").await;

    let all = collection.get(-1, 0).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].title, "story 3");

    let page = collection.get(2, 1).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].title, "story 2");
    assert_eq!(page[1].title, "story 1");
}

#[tokio::test]
async fn page_reflects_viewer_clap_state() {
    let (_, collection) = setup();
    let (id, story) = create_resolved(&collection, "alice").await;
    story
        .publish(publishable("T", vec![], &["life"], "alice"))
        .await
        .unwrap();

    let reader = collection.get_public_story(&id).await.unwrap().unwrap();
    reader.toggle_clap("bob").await.unwrap();

    let anonymous = reader.page(None).await.unwrap();
    assert!(!anonymous.is_clapped);
    assert_eq!(anonymous.claps_count, 1);
    assert_eq!(anonymous.story.tags, vec!["life"]);

    let as_bob = reader.page(Some("bob")).await.unwrap();
    assert!(as_bob.is_clapped);
    assert_eq!(as_bob.claps_count, 1);
}

#[tokio::test]
async fn page_of_draft_is_not_found() {
    let (_, collection) = setup();
    let (_, story) = create_resolved(&collection, "alice").await;

    let err = story.page(None).await.unwrap_err();
    assert!(matches!(err, StoryError::NotFound));
}

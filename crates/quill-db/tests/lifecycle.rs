//! End-to-end lifecycle tests through the real SQLite store: the same
//! operations the web layer drives, down to actual rows.

use std::sync::Arc;
use std::time::Duration;

use quill_core::{CommentDraft, DraftEdits, PublishEdits, Story, StoryCollection, StoryStore};
use quill_db::{Database, SqliteStore};
use quill_types::models::{ContentBlock, StoryState};
use serde_json::json;

fn setup() -> (Arc<Database>, StoryCollection) {
    let db = Arc::new(Database::open_in_memory().expect("in-memory db"));
    let store = Arc::new(SqliteStore::new(db.clone())) as Arc<dyn StoryStore>;
    (db, StoryCollection::new(store))
}

fn seed_user(db: &Database, id: &str, name: &str) {
    db.create_user(id, name, "hash", name, None, None)
        .expect("seed user");
}

fn image(url: &str) -> ContentBlock {
    ContentBlock {
        kind: "image".into(),
        data: json!({ "file": { "url": url } }),
    }
}

fn publish_edits(title: &str, content: Vec<ContentBlock>, tags: &[&str], author: &str) -> PublishEdits {
    PublishEdits {
        title: title.into(),
        content,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        author_id: author.into(),
    }
}

async fn published_story(collection: &StoryCollection, author: &str, title: &str) -> (String, Story) {
    let id = collection.create_story(author).await.unwrap();
    let story = collection.get_private_story(&id, author).await.unwrap().unwrap();
    story
        .publish(publish_edits(title, vec![], &[], author))
        .await
        .unwrap();
    (id, story)
}

#[tokio::test]
async fn draft_then_publish_scenario() {
    let (db, collection) = setup();
    seed_user(&db, "alice", "Alice");

    let id = collection.create_story("alice").await.unwrap();
    let story = collection.get_private_story(&id, "alice").await.unwrap().unwrap();

    story
        .save(DraftEdits {
            title: "".into(),
            content: vec![],
            author_id: "alice".into(),
        })
        .await
        .unwrap();

    let record = story.fetch().await.unwrap();
    assert_eq!(record.title, "Untitled Story");
    assert_eq!(record.state, StoryState::Drafted);
    assert_eq!(record.cover_image, None);

    story
        .publish(publish_edits(
            "Hello",
            vec![image("c.png")],
            &["life"],
            "alice",
        ))
        .await
        .unwrap();

    let record = story.fetch().await.unwrap();
    assert_eq!(record.title, "Hello");
    assert_eq!(record.state, StoryState::Published);
    assert_eq!(record.cover_image.as_deref(), Some("c.png"));

    let page = story.page(None).await.unwrap();
    assert_eq!(page.story.tags, vec!["life"]);
    assert_eq!(page.story.author_name, "Alice");
    assert_eq!(page.claps_count, 0);
}

#[tokio::test]
async fn republish_replaces_tag_rows() {
    let (db, collection) = setup();
    seed_user(&db, "alice", "Alice");

    let id = collection.create_story("alice").await.unwrap();
    let story = collection.get_private_story(&id, "alice").await.unwrap().unwrap();

    story
        .publish(publish_edits("T", vec![], &["a", "b"], "alice"))
        .await
        .unwrap();
    assert_eq!(story.page(None).await.unwrap().story.tags, vec!["a", "b"]);

    story
        .publish(publish_edits("T", vec![], &["c"], "alice"))
        .await
        .unwrap();
    assert_eq!(story.page(None).await.unwrap().story.tags, vec!["c"]);
}

#[tokio::test]
async fn clap_toggle_is_self_inverse_on_real_rows() {
    let (db, collection) = setup();
    seed_user(&db, "alice", "Alice");
    seed_user(&db, "bob", "Bob");

    let (id, _) = published_story(&collection, "alice", "T").await;
    let reader = collection.get_public_story(&id).await.unwrap().unwrap();

    let first = reader.toggle_clap("bob").await.unwrap();
    assert!(first.is_clapped);
    assert_eq!(first.claps_count, 1);

    let second = reader.toggle_clap("bob").await.unwrap();
    assert!(!second.is_clapped);
    assert_eq!(second.claps_count, 0);

    assert_eq!(db.clap_count(&id).unwrap(), 0);
}

#[tokio::test]
async fn claps_count_across_users() {
    let (db, collection) = setup();
    seed_user(&db, "alice", "Alice");
    seed_user(&db, "bob", "Bob");
    seed_user(&db, "carol", "Carol");

    let (id, _) = published_story(&collection, "alice", "T").await;
    let reader = collection.get_public_story(&id).await.unwrap().unwrap();

    reader.toggle_clap("bob").await.unwrap();
    let info = reader.toggle_clap("carol").await.unwrap();
    assert!(info.is_clapped);
    assert_eq!(info.claps_count, 2);

    // Anonymous page sees the total without a viewer membership.
    let page = reader.page(None).await.unwrap();
    assert_eq!(page.claps_count, 2);
    assert!(!page.is_clapped);
}

#[tokio::test]
async fn private_lookup_rejects_other_authors() {
    let (db, collection) = setup();
    seed_user(&db, "alice", "Alice");
    seed_user(&db, "bob", "Bob");

    let id = collection.create_story("bob").await.unwrap();

    assert!(collection.get_private_story(&id, "alice").await.unwrap().is_none());
    assert!(collection.get_private_story(&id, "bob").await.unwrap().is_some());
}

#[tokio::test]
async fn public_lookup_hides_drafts() {
    let (db, collection) = setup();
    seed_user(&db, "alice", "Alice");

    let id = collection.create_story("alice").await.unwrap();
    assert!(collection.get_public_story(&id).await.unwrap().is_none());

    let story = collection.get_private_story(&id, "alice").await.unwrap().unwrap();
    story
        .publish(publish_edits("T", vec![], &[], "alice"))
        .await
        .unwrap();
    assert!(collection.get_public_story(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn comments_append_in_order_with_author_names() {
    let (db, collection) = setup();
    seed_user(&db, "alice", "Alice");
    seed_user(&db, "bob", "Bob");

    let (id, story) = published_story(&collection, "alice", "T").await;

    story
        .comment(CommentDraft {
            author_id: "bob".into(),
            text: "first".into(),
        })
        .await
        .unwrap();
    story
        .comment(CommentDraft {
            author_id: "alice".into(),
            text: "second".into(),
        })
        .await
        .unwrap();

    let comments = collection.list_comments_on(&id).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].text, "first");
    assert_eq!(comments[0].author_name, "Bob");
    assert_eq!(comments[1].text, "second");
    assert_eq!(comments[1].author_name, "Alice");
}

#[tokio::test]
async fn feed_orders_newest_first_and_pages() {
    let (db, collection) = setup();
    seed_user(&db, "alice", "Alice");

    for n in 0..3 {
        published_story(&collection, "alice", &format!("story {n}")).await;
        // Millisecond timestamp resolution; keep last_modified distinct.
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    // Drafts never surface in the feed.
    collection.create_story("alice").await.unwrap();

    let all = collection.get(-1, 0).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].title, "story 2");
    assert_eq!(all[2].title, "story 0");

    let page = collection.get(1, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title, "story 1");
}

#[tokio::test]
async fn user_story_listings_split_by_state() {
    let (db, collection) = setup();
    seed_user(&db, "alice", "Alice");

    published_story(&collection, "alice", "published one").await;
    let draft_id = collection.create_story("alice").await.unwrap();
    let draft = collection
        .get_private_story(&draft_id, "alice")
        .await
        .unwrap()
        .unwrap();
    draft
        .save(DraftEdits {
            title: "work in progress".into(),
            content: vec![],
            author_id: "alice".into(),
        })
        .await
        .unwrap();

    let published = db.get_user_stories("alice", "published").unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].title, "published one");

    let drafted = db.get_user_stories("alice", "drafted").unwrap();
    assert_eq!(drafted.len(), 1);
    assert_eq!(drafted[0].title, "work in progress");
}

#[tokio::test]
async fn profile_lists_only_published_stories() {
    let (db, collection) = setup();
    seed_user(&db, "alice", "Alice");

    published_story(&collection, "alice", "visible").await;
    collection.create_story("alice").await.unwrap();

    let stories = db.get_profile_stories("alice").unwrap();
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0].title, "visible");
}

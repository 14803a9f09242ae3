use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a story. Stories start drafted and move to published;
/// re-saving a published story puts it back into draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryState {
    Drafted,
    Published,
}

impl StoryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drafted => "drafted",
            Self::Published => "published",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "drafted" => Some(Self::Drafted),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

/// One block of editor content. Opaque to the server except for `image`
/// blocks, whose `data.file.url` is read for cover derivation and upload
/// bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A story as its owner sees it in the editor, any state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRecord {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: Vec<ContentBlock>,
    pub state: StoryState,
    pub cover_image: Option<String>,
    pub last_modified: DateTime<Utc>,
}

/// A published story joined with its author and tags, as readers see it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedStory {
    pub id: String,
    pub title: String,
    pub content: Vec<ContentBlock>,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub tags: Vec<String>,
    pub last_modified: DateTime<Utc>,
}

/// A published story plus the viewer's clap state — the story-page payload.
#[derive(Debug, Clone, Serialize)]
pub struct StoryPage {
    #[serde(flatten)]
    pub story: PublishedStory,
    pub claps_count: i64,
    pub is_clapped: bool,
}

/// A feed/dashboard entry: recent published story with its author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedStory {
    pub id: String,
    pub title: String,
    pub content: Vec<ContentBlock>,
    pub cover_image: Option<String>,
    pub author_id: String,
    pub author_name: String,
    pub last_modified: DateTime<Utc>,
}

/// Clap state for one (story, viewer) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClapInfo {
    pub is_clapped: bool,
    pub claps_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub story_id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub commented_at: DateTime<Utc>,
}

/// Title-level entry in a user's drafted/published story lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryListing {
    pub id: String,
    pub title: String,
    pub last_modified: DateTime<Utc>,
}

/// A story as shown on its author's public profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileStory {
    pub id: String,
    pub title: String,
    pub content: Vec<ContentBlock>,
    pub cover_image: Option<String>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub stories: Vec<ProfileStory>,
}

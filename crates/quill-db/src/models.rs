/// Database row types — one struct per query shape, mapping directly to the
/// columns that query selects. Distinct from quill-types models so the DB
/// layer stays independent of the API surface.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
}

/// Owner's view of a story, any state. `content` is the serialized block
/// sequence as stored.
pub struct StoryRow {
    pub id: String,
    pub written_by: String,
    pub title: String,
    pub content: String,
    pub state: String,
    pub cover_image: Option<String>,
    pub last_modified: String,
}

/// A published story joined with its author; `tags` is the comma-joined
/// aggregate, absent when the story has none.
pub struct PublishedStoryRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub tags: Option<String>,
    pub last_modified: String,
}

pub struct FeedStoryRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub author_id: String,
    pub author_name: String,
    pub last_modified: String,
}

pub struct CommentRow {
    pub story_id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    pub commented_at: String,
}

/// Title-level entry for a user's drafted/published listings.
pub struct StoryListingRow {
    pub id: String,
    pub title: String,
    pub last_modified: String,
}

/// A published story as listed on its author's profile.
pub struct ProfileStoryRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub last_modified: String,
}

use crate::Database;
use crate::models::{
    CommentRow, FeedStoryRow, ProfileStoryRow, PublishedStoryRow, StoryListingRow, StoryRow,
    UserRow,
};
use anyhow::Result;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        display_name: &str,
        avatar_url: Option<&str>,
        bio: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, display_name, avatar_url, bio)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![id, username, password_hash, display_name, avatar_url, bio],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Stories --

    pub fn create_story(&self, id: &str, author_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO stories (id, written_by) VALUES (?1, ?2)",
                [id, author_id],
            )?;
            Ok(())
        })
    }

    pub fn get_story(&self, story_id: &str) -> Result<Option<StoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, written_by, title, content, state, cover_image, last_modified
                 FROM stories WHERE id = ?1",
            )?;
            stmt.query_row([story_id], story_row).optional()
        })
    }

    pub fn get_story_of_user(&self, story_id: &str, author_id: &str) -> Result<Option<StoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, written_by, title, content, state, cover_image, last_modified
                 FROM stories WHERE id = ?1 AND written_by = ?2",
            )?;
            stmt.query_row([story_id, author_id], story_row).optional()
        })
    }

    pub fn get_published_story(&self, story_id: &str) -> Result<Option<PublishedStoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT str.id, str.title, str.content, str.written_by,
                        usr.display_name, usr.avatar_url,
                        GROUP_CONCAT(tags.tag), str.last_modified
                 FROM stories AS str
                 JOIN users AS usr ON str.written_by = usr.id
                 LEFT JOIN tags ON str.id = tags.tag_on
                 WHERE str.state = 'published' AND str.id = ?1
                 GROUP BY str.id",
            )?;
            stmt.query_row([story_id], |row| {
                Ok(PublishedStoryRow {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    content: row.get(2)?,
                    author_id: row.get(3)?,
                    author_name: row.get(4)?,
                    author_avatar: row.get(5)?,
                    tags: row.get(6)?,
                    last_modified: row.get(7)?,
                })
            })
            .optional()
        })
    }

    /// Recent published stories, newest first. `count = -1` means all —
    /// SQLite treats a negative LIMIT as unbounded.
    pub fn get_latest_stories(&self, count: i64, offset: i64) -> Result<Vec<FeedStoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT str.id, str.title, str.content, str.cover_image,
                        str.written_by, usr.display_name, str.last_modified
                 FROM stories AS str
                 JOIN users AS usr ON str.written_by = usr.id
                 WHERE str.state = 'published'
                 ORDER BY str.last_modified DESC
                 LIMIT ?1 OFFSET ?2",
            )?;
            let rows = stmt
                .query_map([count, offset], |row| {
                    Ok(FeedStoryRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        content: row.get(2)?,
                        cover_image: row.get(3)?,
                        author_id: row.get(4)?,
                        author_name: row.get(5)?,
                        last_modified: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Full-body update keyed by (story, author); bumps `last_modified`.
    pub fn update_story(
        &self,
        story_id: &str,
        author_id: &str,
        title: &str,
        content: &str,
        state: &str,
        cover_image: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE stories
                 SET title = ?1, content = ?2, state = ?3, cover_image = ?4,
                     last_modified = strftime('%Y-%m-%dT%H:%M:%fZ','now')
                 WHERE id = ?5 AND written_by = ?6",
                rusqlite::params![title, content, state, cover_image, story_id, author_id],
            )?;
            Ok(())
        })
    }

    pub fn get_user_stories(&self, author_id: &str, state: &str) -> Result<Vec<StoryListingRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, last_modified
                 FROM stories
                 WHERE written_by = ?1 AND state = ?2
                 ORDER BY last_modified DESC",
            )?;
            let rows = stmt
                .query_map([author_id, state], |row| {
                    Ok(StoryListingRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        last_modified: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_profile_stories(&self, author_id: &str) -> Result<Vec<ProfileStoryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, content, cover_image, last_modified
                 FROM stories
                 WHERE written_by = ?1 AND state = 'published'
                 ORDER BY last_modified DESC",
            )?;
            let rows = stmt
                .query_map([author_id], |row| {
                    Ok(ProfileStoryRow {
                        id: row.get(0)?,
                        title: row.get(1)?,
                        content: row.get(2)?,
                        cover_image: row.get(3)?,
                        last_modified: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Tags --

    pub fn delete_tags(&self, story_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM tags WHERE tag_on = ?1", [story_id])?;
            Ok(())
        })
    }

    pub fn add_tag(&self, story_id: &str, tag: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO tags (tag_on, tag) VALUES (?1, ?2)",
                [story_id, tag],
            )?;
            Ok(())
        })
    }

    // -- Claps --

    /// Count plus the given user's membership, in one read.
    pub fn get_clap_info(&self, story_id: &str, user_id: &str) -> Result<(bool, i64)> {
        self.with_conn(|conn| {
            let row = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM claps WHERE clapped_on = ?1 AND clapped_by = ?2),
                        (SELECT COUNT(*) FROM claps WHERE clapped_on = ?1)",
                [story_id, user_id],
                |row| Ok((row.get::<_, bool>(0)?, row.get::<_, i64>(1)?)),
            )?;
            Ok(row)
        })
    }

    pub fn add_clap(&self, story_id: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO claps (clapped_on, clapped_by) VALUES (?1, ?2)",
                [story_id, user_id],
            )?;
            Ok(())
        })
    }

    pub fn remove_clap(&self, story_id: &str, user_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM claps WHERE clapped_on = ?1 AND clapped_by = ?2",
                [story_id, user_id],
            )?;
            Ok(())
        })
    }

    pub fn clap_count(&self, story_id: &str) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM claps WHERE clapped_on = ?1",
                [story_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    // -- Comments --

    pub fn list_comments(&self, story_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT cmt.commented_on, cmt.commented_by, usr.display_name,
                        cmt.text, cmt.commented_at
                 FROM comments AS cmt
                 JOIN users AS usr ON cmt.commented_by = usr.id
                 WHERE cmt.commented_on = ?1
                 ORDER BY cmt.rowid",
            )?;
            let rows = stmt
                .query_map([story_id], |row| {
                    Ok(CommentRow {
                        story_id: row.get(0)?,
                        author_id: row.get(1)?,
                        author_name: row.get(2)?,
                        text: row.get(3)?,
                        commented_at: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn add_comment(
        &self,
        comment_id: &str,
        story_id: &str,
        author_id: &str,
        text: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, commented_on, commented_by, text)
                 VALUES (?1, ?2, ?3, ?4)",
                [comment_id, story_id, author_id, text],
            )?;
            Ok(())
        })
    }
}

fn story_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoryRow> {
    Ok(StoryRow {
        id: row.get(0)?,
        written_by: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        state: row.get(4)?,
        cover_image: row.get(5)?,
        last_modified: row.get(6)?,
    })
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is compile-time constant at every call site, never user input.
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, password, display_name, avatar_url, bio, created_at
         FROM users WHERE {column} = ?1"
    ))?;

    stmt.query_row([value], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            display_name: row.get(3)?,
            avatar_url: row.get(4)?,
            bio: row.get(5)?,
            created_at: row.get(6)?,
        })
    })
    .optional()
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id              TEXT PRIMARY KEY,
            username        TEXT NOT NULL UNIQUE,
            password        TEXT NOT NULL,
            display_name    TEXT NOT NULL,
            avatar_url      TEXT,
            bio             TEXT,
            created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE TABLE IF NOT EXISTS stories (
            id              TEXT PRIMARY KEY,
            written_by      TEXT NOT NULL REFERENCES users(id),
            title           TEXT NOT NULL DEFAULT '',
            content         TEXT NOT NULL DEFAULT '[]',
            state           TEXT NOT NULL DEFAULT 'drafted'
                            CHECK (state IN ('drafted', 'published')),
            cover_image     TEXT,
            last_modified   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_stories_feed
            ON stories(state, last_modified);
        CREATE INDEX IF NOT EXISTS idx_stories_author
            ON stories(written_by, state);

        CREATE TABLE IF NOT EXISTS tags (
            tag_on      TEXT NOT NULL REFERENCES stories(id),
            tag         TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tags_story
            ON tags(tag_on);

        CREATE TABLE IF NOT EXISTS claps (
            clapped_on  TEXT NOT NULL REFERENCES stories(id),
            clapped_by  TEXT NOT NULL REFERENCES users(id),
            UNIQUE(clapped_on, clapped_by)
        );

        CREATE INDEX IF NOT EXISTS idx_claps_story
            ON claps(clapped_on);

        CREATE TABLE IF NOT EXISTS comments (
            id              TEXT PRIMARY KEY,
            commented_on    TEXT NOT NULL REFERENCES stories(id),
            commented_by    TEXT NOT NULL REFERENCES users(id),
            text            TEXT NOT NULL,
            commented_at    TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_comments_story
            ON comments(commented_on);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}

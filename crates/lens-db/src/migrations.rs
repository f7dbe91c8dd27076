use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub const CURRENT_VERSION: i64 = 1;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE user (
                id          INTEGER PRIMARY KEY,
                email       TEXT NOT NULL UNIQUE CHECK (length(email) <= 120),
                password    TEXT NOT NULL,
                is_active   BOOLEAN NOT NULL CHECK (is_active IN (0, 1))
            );

            CREATE TABLE post (
                id          INTEGER PRIMARY KEY,
                user_id     INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                image_url   TEXT NOT NULL CHECK (length(image_url) <= 250),
                caption     TEXT,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f+00:00', 'now'))
            );

            CREATE INDEX idx_post_user ON post(user_id, created_at);

            CREATE TABLE comment (
                id          INTEGER PRIMARY KEY,
                user_id     INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                post_id     INTEGER NOT NULL REFERENCES post(id) ON DELETE CASCADE,
                text        TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%d %H:%M:%f+00:00', 'now'))
            );

            CREATE INDEX idx_comment_post ON comment(post_id, created_at);
            CREATE INDEX idx_comment_user ON comment(user_id);

            -- user_id is followed by follower_id
            CREATE TABLE follower (
                id           INTEGER PRIMARY KEY,
                user_id      INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE,
                follower_id  INTEGER NOT NULL REFERENCES user(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_follower_user ON follower(user_id);
            CREATE INDEX idx_follower_follower ON follower(follower_id);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete (schema v{})", CURRENT_VERSION);
    Ok(())
}

use chrono::Utc;
use lens_types::api::{NewComment, NewPost, NewUser};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::error::{DbError, Result, is_unique_violation};
use crate::models::{
    COMMENT_COLUMNS, CommentRow, FOLLOWER_COLUMNS, FollowerRow, POST_COLUMNS, PostRow,
    USER_COLUMNS, UserRow,
};
use crate::Database;

impl Database {
    // -- Users --

    pub fn create_user(&self, new: &NewUser) -> Result<UserRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO user (email, password, is_active) VALUES (?1, ?2, ?3)",
                params![new.email, new.password, new.is_active],
            )
            .map_err(|e| email_error(e, &new.email))?;

            let id = conn.last_insert_rowid();
            debug!("Created user {}", id);
            Ok(UserRow {
                id,
                email: new.email.clone(),
                password: new.password.clone(),
                is_active: new.is_active,
            })
        })
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email = ?1", email))
    }

    pub fn set_user_active(&self, id: i64, is_active: bool) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE user SET is_active = ?2 WHERE id = ?1",
                params![id, is_active],
            )?;
            expect_changed(changed, "user", id)
        })
    }

    pub fn update_user_email(&self, id: i64, email: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("UPDATE user SET email = ?2 WHERE id = ?1", params![id, email])
                .map_err(|e| email_error(e, email))?;
            expect_changed(changed, "user", id)
        })
    }

    pub fn update_user_password(&self, id: i64, password_hash: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE user SET password = ?2 WHERE id = ?1",
                params![id, password_hash],
            )?;
            expect_changed(changed, "user", id)
        })
    }

    /// Deleting a user cascades to their posts, their comments, comments on
    /// their posts, and follow edges in both directions.
    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM user WHERE id = ?1", [id])?;
            expect_changed(changed, "user", id)?;
            debug!("Deleted user {}", id);
            Ok(())
        })
    }

    // -- Posts --

    pub fn create_post(&self, new: &NewPost) -> Result<PostRow> {
        let created_at = new.created_at.unwrap_or_else(Utc::now);

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO post (user_id, image_url, caption, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![new.user_id, new.image_url, new.caption, created_at],
            )
            .map_err(|e| DbError::from_write(e, "post"))?;

            let id = conn.last_insert_rowid();
            debug!("Created post {} for user {}", id, new.user_id);
            Ok(PostRow {
                id,
                user_id: new.user_id,
                image_url: new.image_url.clone(),
                caption: new.caption.clone(),
                created_at,
            })
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {POST_COLUMNS} FROM post WHERE id = ?1"),
                    [id],
                    PostRow::from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// A user's posts, newest first.
    pub fn posts_by_user(&self, user_id: i64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS} FROM post WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], PostRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn post_author(&self, post_id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT u.id, u.email, u.password, u.is_active
                     FROM user u
                     JOIN post p ON p.user_id = u.id
                     WHERE p.id = ?1",
                    [post_id],
                    UserRow::from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_post_caption(&self, id: i64, caption: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE post SET caption = ?2 WHERE id = ?1",
                params![id, caption],
            )?;
            expect_changed(changed, "post", id)
        })
    }

    /// Removes the post and every comment on it.
    pub fn delete_post(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM post WHERE id = ?1", [id])?;
            expect_changed(changed, "post", id)?;
            debug!("Deleted post {}", id);
            Ok(())
        })
    }

    // -- Comments --

    pub fn create_comment(&self, new: &NewComment) -> Result<CommentRow> {
        let created_at = new.created_at.unwrap_or_else(Utc::now);

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comment (user_id, post_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![new.user_id, new.post_id, new.text, created_at],
            )
            .map_err(|e| DbError::from_write(e, "comment"))?;

            let id = conn.last_insert_rowid();
            debug!("Created comment {} on post {}", id, new.post_id);
            Ok(CommentRow {
                id,
                user_id: new.user_id,
                post_id: new.post_id,
                text: new.text.clone(),
                created_at,
            })
        })
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("SELECT {COMMENT_COLUMNS} FROM comment WHERE id = ?1"),
                    [id],
                    CommentRow::from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Comments on a post, oldest first.
    pub fn comments_for_post(&self, post_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| query_comments(conn, "post_id", post_id))
    }

    pub fn comments_by_user(&self, user_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| query_comments(conn, "user_id", user_id))
    }

    pub fn update_comment_text(&self, id: i64, text: &str) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn
                .execute("UPDATE comment SET text = ?2 WHERE id = ?1", params![id, text])
                .map_err(|e| DbError::from_write(e, "comment"))?;
            expect_changed(changed, "comment", id)
        })
    }

    pub fn delete_comment(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM comment WHERE id = ?1", [id])?;
            expect_changed(changed, "comment", id)
        })
    }

    // -- Followers --

    /// Record that `follower_id` follows `user_id`.
    pub fn follow(&self, user_id: i64, follower_id: i64) -> Result<FollowerRow> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO follower (user_id, follower_id) VALUES (?1, ?2)",
                params![user_id, follower_id],
            )
            .map_err(|e| DbError::from_write(e, "follower"))?;

            let id = conn.last_insert_rowid();
            debug!("User {} now follows user {}", follower_id, user_id);
            Ok(FollowerRow {
                id,
                user_id,
                follower_id,
            })
        })
    }

    /// Returns true if at least one edge was removed.
    pub fn unfollow(&self, user_id: i64, follower_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM follower WHERE user_id = ?1 AND follower_id = ?2",
                params![user_id, follower_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_follower(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM follower WHERE id = ?1", [id])?;
            expect_changed(changed, "follower", id)
        })
    }

    /// Edges where `user_id` is the one being followed.
    pub fn followers_of(&self, user_id: i64) -> Result<Vec<FollowerRow>> {
        self.with_conn(|conn| query_followers(conn, "user_id", user_id))
    }

    /// Edges where `user_id` is the one following.
    pub fn following_of(&self, user_id: i64) -> Result<Vec<FollowerRow>> {
        self.with_conn(|conn| query_followers(conn, "follower_id", user_id))
    }
}

fn query_user<P: rusqlite::ToSql>(
    conn: &Connection,
    filter: &str,
    value: P,
) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE {filter}"))?;
    let row = stmt.query_row([value], UserRow::from_row).optional()?;
    Ok(row)
}

// `column` is always one of our own literals, never caller input.
fn query_comments(conn: &Connection, column: &str, id: i64) -> Result<Vec<CommentRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comment WHERE {column} = ?1
         ORDER BY created_at ASC, id ASC"
    ))?;
    let rows = stmt
        .query_map([id], CommentRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_followers(conn: &Connection, column: &str, id: i64) -> Result<Vec<FollowerRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FOLLOWER_COLUMNS} FROM follower WHERE {column} = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map([id], FollowerRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn email_error(err: rusqlite::Error, email: &str) -> DbError {
    if is_unique_violation(&err) {
        DbError::EmailTaken(email.to_string())
    } else {
        DbError::from_write(err, "user")
    }
}

fn expect_changed(changed: usize, table: &'static str, id: i64) -> Result<()> {
    if changed == 0 {
        return Err(DbError::NotFound { table, id });
    }
    Ok(())
}

//! Database row types — these map directly to SQLite rows.
//! `serialize()` projects each one onto its public lens-types shape.
use chrono::{DateTime, Utc};
use lens_types::models::{Comment, Follower, Post, User};
use rusqlite::Row;
use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRow {
    pub id: i64,
    pub user_id: i64,
    pub image_url: String,
    pub caption: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRow {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerRow {
    pub id: i64,
    pub user_id: i64,
    pub follower_id: i64,
}

// -- Column lists, in the order the `from_row` constructors read them --

pub(crate) const USER_COLUMNS: &str = "id, email, password, is_active";
pub(crate) const POST_COLUMNS: &str = "id, user_id, image_url, caption, created_at";
pub(crate) const COMMENT_COLUMNS: &str = "id, user_id, post_id, text, created_at";
pub(crate) const FOLLOWER_COLUMNS: &str = "id, user_id, follower_id";

impl UserRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            password: row.get(2)?,
            is_active: row.get(3)?,
        })
    }

    /// `{"id", "email"}` only. The password never leaves the row.
    pub fn serialize(&self) -> Value {
        json!(User::from(self))
    }
}

impl PostRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            image_url: row.get(2)?,
            caption: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    pub fn serialize(&self) -> Value {
        json!(Post::from(self))
    }
}

impl CommentRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            post_id: row.get(2)?,
            text: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    pub fn serialize(&self) -> Value {
        json!(Comment::from(self))
    }
}

impl FollowerRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            follower_id: row.get(2)?,
        })
    }

    pub fn serialize(&self) -> Value {
        json!(Follower::from(self))
    }
}

impl From<&UserRow> for User {
    fn from(row: &UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email.clone(),
        }
    }
}

impl From<&PostRow> for Post {
    fn from(row: &PostRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            image_url: row.image_url.clone(),
            caption: row.caption.clone(),
            created_at: row.created_at,
        }
    }
}

impl From<&CommentRow> for Comment {
    fn from(row: &CommentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            post_id: row.post_id,
            text: row.text.clone(),
            created_at: row.created_at,
        }
    }
}

impl From<&FollowerRow> for Follower {
    fn from(row: &FollowerRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            follower_id: row.follower_id,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::Deserialize;

// -- Users --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewUser {
    pub email: String,
    /// Stored as given. Hashing belongs to whoever calls the database.
    pub password: String,
    pub is_active: bool,
}

// -- Posts --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPost {
    pub user_id: i64,
    pub image_url: String,
    #[serde(default)]
    pub caption: Option<String>,
    /// Defaults to the insert time when absent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

// -- Comments --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewComment {
    pub user_id: i64,
    pub post_id: i64,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

//! Data models
//!
//! Rust structs representing database entities.
//! Ids are SQLite integer primary keys; timestamps use chrono.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// User
// =============================================================================

/// A registered user
///
/// Credentials are stored as a salted digest; see `auth::credentials`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub password_salt: String,
    pub deleted: bool,
    pub joined: DateTime<Utc>,
}

/// Data needed to provision a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub password_salt: String,
}

// =============================================================================
// Tweet
// =============================================================================

/// A tweet row
///
/// The reply tree is stored only as the `in_reply_to` pointer;
/// replies are looked up by parent id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tweet {
    pub id: i64,
    pub author_id: i64,
    /// None for reposts
    pub content: Option<String>,
    pub posted: DateTime<Utc>,
    pub deleted: bool,
    pub in_reply_to: Option<i64>,
    pub repost_of: Option<i64>,
}

/// A tweet about to be inserted
#[derive(Debug, Clone)]
pub struct NewTweet {
    pub author_id: i64,
    pub content: Option<String>,
    pub in_reply_to: Option<i64>,
    pub repost_of: Option<i64>,
}

/// A tweet together with the relationships shown to clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetView {
    pub tweet: Tweet,
    pub author: User,
    /// Hashtag labels in attachment order
    pub hashtags: Vec<String>,
    /// Usernames of mentioned (non-deleted) users
    pub mentions: Vec<String>,
    /// Likes by non-deleted users
    pub like_count: i64,
}

// =============================================================================
// Hashtag
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Hashtag {
    pub id: i64,
    /// Unique, case-sensitive as typed
    pub label: String,
    pub first_used: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

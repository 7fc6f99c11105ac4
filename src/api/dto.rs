//! Request and response DTOs
//!
//! Data Transfer Objects for the JSON API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Credentials;

/// Body of tweet and reply creation
///
/// Both fields are optional on the wire so that missing values reach the
/// service and are reported as a bad request.
#[derive(Debug, Deserialize)]
pub struct TweetRequest {
    pub content: Option<String>,
    pub credentials: Option<Credentials>,
}

/// User response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub joined: DateTime<Utc>,
}

/// Tweet response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetResponse {
    pub id: i64,
    pub author: UserResponse,
    pub content: Option<String>,
    pub posted: DateTime<Utc>,
    pub deleted: bool,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub like_count: i64,
    pub in_reply_to: Option<i64>,
    pub repost_of: Option<i64>,
}

/// Hashtag response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagResponse {
    pub id: i64,
    pub label: String,
    pub first_used: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
}

/// Thread context response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResponse {
    pub before: Vec<TweetResponse>,
    pub target: TweetResponse,
    pub after: Vec<TweetResponse>,
}

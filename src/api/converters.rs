//! Conversion functions from domain models to API DTOs

use crate::api::dto::*;
use crate::data::{Hashtag, TweetView, User};
use crate::service::Context;

/// Convert User to UserResponse
pub fn user_to_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username.clone(),
        joined: user.joined,
    }
}

/// Convert TweetView to TweetResponse
pub fn tweet_to_response(view: &TweetView) -> TweetResponse {
    TweetResponse {
        id: view.tweet.id,
        author: user_to_response(&view.author),
        content: view.tweet.content.clone(),
        posted: view.tweet.posted,
        deleted: view.tweet.deleted,
        hashtags: view.hashtags.clone(),
        mentions: view.mentions.clone(),
        like_count: view.like_count,
        in_reply_to: view.tweet.in_reply_to,
        repost_of: view.tweet.repost_of,
    }
}

pub fn tweets_to_response(views: &[TweetView]) -> Vec<TweetResponse> {
    views.iter().map(tweet_to_response).collect()
}

pub fn users_to_response(users: &[User]) -> Vec<UserResponse> {
    users.iter().map(user_to_response).collect()
}

pub fn hashtag_to_response(hashtag: &Hashtag) -> HashtagResponse {
    HashtagResponse {
        id: hashtag.id,
        label: hashtag.label.clone(),
        first_used: hashtag.first_used,
        last_used: hashtag.last_used,
    }
}

pub fn hashtags_to_response(hashtags: &[Hashtag]) -> Vec<HashtagResponse> {
    hashtags.iter().map(hashtag_to_response).collect()
}

pub fn context_to_response(context: &Context) -> ContextResponse {
    ContextResponse {
        before: tweets_to_response(&context.before),
        target: tweet_to_response(&context.target),
        after: tweets_to_response(&context.after),
    }
}

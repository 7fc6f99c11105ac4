//! API layer
//!
//! HTTP handlers for:
//! - Tweets and their relationships
//! - Hashtags
//! - Validation lookups
//! - Metrics (Prometheus)

mod converters;
mod dto;
mod extract;
mod hashtags;
pub mod metrics;
mod tweets;

pub use converters::*;
pub use dto::*;
pub use extract::ApiJson;

pub use metrics::{metrics_router, track_http_metrics};

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

/// Create the tweet, hashtag and validation router
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/tweets", get(tweets::get_all_tweets).post(tweets::create_tweet))
        .route(
            "/tweets/:id",
            get(tweets::get_tweet).delete(tweets::delete_tweet),
        )
        .route("/tweets/:id/like", post(tweets::like_tweet))
        .route("/tweets/:id/reply", post(tweets::reply_to_tweet))
        .route("/tweets/:id/repost", post(tweets::repost_tweet))
        .route("/tweets/:id/tags", get(tweets::get_tags))
        .route("/tweets/:id/likes", get(tweets::get_likes))
        .route("/tweets/:id/context", get(tweets::get_context))
        .route("/tweets/:id/chain", get(tweets::get_reply_chain))
        .route("/tweets/:id/replies", get(tweets::get_replies))
        .route("/tweets/:id/reposts", get(tweets::get_reposts))
        .route("/tweets/:id/mentions", get(tweets::get_mentions))
        .route("/tags", get(hashtags::get_all_hashtags))
        .route("/tags/:label", get(hashtags::get_tweets_by_hashtag))
        .route(
            "/validate/username/exists/:username",
            get(hashtags::username_exists),
        )
        .route(
            "/validate/username/available/:username",
            get(hashtags::username_available),
        )
        .route("/validate/tag/exists/:label", get(hashtags::hashtag_exists))
}

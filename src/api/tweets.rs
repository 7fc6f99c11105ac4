//! Tweet endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::AppState;
use crate::api::converters::*;
use crate::api::dto::*;
use crate::api::extract::ApiJson;
use crate::auth::Credentials;
use crate::error::AppError;
use crate::service::TweetService;

fn build_tweet_service(state: &AppState) -> TweetService {
    TweetService::new(state.db.clone(), state.config.thread.max_depth)
}

/// GET /tweets
pub async fn get_all_tweets(
    State(state): State<AppState>,
) -> Result<Json<Vec<TweetResponse>>, AppError> {
    let tweets = build_tweet_service(&state).get_all_tweets().await?;
    Ok(Json(tweets_to_response(&tweets)))
}

/// POST /tweets
pub async fn create_tweet(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TweetRequest>,
) -> Result<(StatusCode, Json<TweetResponse>), AppError> {
    let tweet = build_tweet_service(&state)
        .create_tweet(request.content, request.credentials)
        .await?;
    Ok((StatusCode::CREATED, Json(tweet_to_response(&tweet))))
}

/// GET /tweets/:id
pub async fn get_tweet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TweetResponse>, AppError> {
    let tweet = build_tweet_service(&state).get_tweet(id).await?;
    Ok(Json(tweet_to_response(&tweet)))
}

/// DELETE /tweets/:id
pub async fn delete_tweet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<TweetResponse>, AppError> {
    let tweet = build_tweet_service(&state)
        .delete_tweet(id, &credentials)
        .await?;
    Ok(Json(tweet_to_response(&tweet)))
}

/// POST /tweets/:id/like
pub async fn like_tweet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<StatusCode, AppError> {
    build_tweet_service(&state)
        .like_tweet(id, &credentials)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /tweets/:id/reply
pub async fn reply_to_tweet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<TweetRequest>,
) -> Result<(StatusCode, Json<TweetResponse>), AppError> {
    let tweet = build_tweet_service(&state)
        .create_reply_to_tweet(id, request.content, request.credentials)
        .await?;
    Ok((StatusCode::CREATED, Json(tweet_to_response(&tweet))))
}

/// POST /tweets/:id/repost
pub async fn repost_tweet(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<TweetResponse>), AppError> {
    let tweet = build_tweet_service(&state)
        .repost_tweet(id, &credentials)
        .await?;
    Ok((StatusCode::CREATED, Json(tweet_to_response(&tweet))))
}

/// GET /tweets/:id/tags
pub async fn get_tags(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<HashtagResponse>>, AppError> {
    let tags = build_tweet_service(&state).get_tags(id).await?;
    Ok(Json(hashtags_to_response(&tags)))
}

/// GET /tweets/:id/likes
pub async fn get_likes(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = build_tweet_service(&state).get_tweet_likes(id).await?;
    Ok(Json(users_to_response(&users)))
}

/// GET /tweets/:id/context
pub async fn get_context(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ContextResponse>, AppError> {
    let context = build_tweet_service(&state).get_context(id).await?;
    Ok(Json(context_to_response(&context)))
}

/// GET /tweets/:id/chain
pub async fn get_reply_chain(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TweetResponse>>, AppError> {
    let chain = build_tweet_service(&state).get_reply_chain(id).await?;
    Ok(Json(tweets_to_response(&chain)))
}

/// GET /tweets/:id/replies
pub async fn get_replies(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TweetResponse>>, AppError> {
    let replies = build_tweet_service(&state).get_replies(id).await?;
    Ok(Json(tweets_to_response(&replies)))
}

/// GET /tweets/:id/reposts
pub async fn get_reposts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TweetResponse>>, AppError> {
    let reposts = build_tweet_service(&state).get_tweet_reposts(id).await?;
    Ok(Json(tweets_to_response(&reposts)))
}

/// GET /tweets/:id/mentions
pub async fn get_mentions(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = build_tweet_service(&state).get_tweet_mentions(id).await?;
    Ok(Json(users_to_response(&users)))
}

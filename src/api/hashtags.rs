//! Hashtag and validation endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};

use crate::AppState;
use crate::api::converters::*;
use crate::api::dto::*;
use crate::error::AppError;
use crate::service::{HashtagService, ValidateService};

/// GET /tags
pub async fn get_all_hashtags(
    State(state): State<AppState>,
) -> Result<Json<Vec<HashtagResponse>>, AppError> {
    let hashtags = HashtagService::new(state.db.clone())
        .get_all_hashtags()
        .await?;
    Ok(Json(hashtags_to_response(&hashtags)))
}

/// GET /tags/:label
pub async fn get_tweets_by_hashtag(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> Result<Json<Vec<TweetResponse>>, AppError> {
    let tweets = HashtagService::new(state.db.clone())
        .get_tweets_by_hashtag(&label)
        .await?;
    Ok(Json(tweets_to_response(&tweets)))
}

/// Clients may send the username with its `@`
fn strip_at(username: &str) -> &str {
    username.strip_prefix('@').unwrap_or(username)
}

/// GET /validate/username/exists/:username
pub async fn username_exists(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<bool>, AppError> {
    let exists = ValidateService::new(state.db.clone())
        .username_exists(strip_at(&username))
        .await?;
    Ok(Json(exists))
}

/// GET /validate/username/available/:username
pub async fn username_available(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<bool>, AppError> {
    let available = ValidateService::new(state.db.clone())
        .username_available(strip_at(&username))
        .await?;
    Ok(Json(available))
}

/// GET /validate/tag/exists/:label
pub async fn hashtag_exists(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> Result<Json<bool>, AppError> {
    let exists = ValidateService::new(state.db.clone())
        .hashtag_exists(&label)
        .await?;
    Ok(Json(exists))
}

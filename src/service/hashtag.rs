//! Hashtag service

use std::sync::Arc;

use crate::data::{Database, Hashtag, TweetView};
use crate::error::AppError;

/// Hashtag service
pub struct HashtagService {
    db: Arc<Database>,
}

impl HashtagService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Every hashtag, ordered by label
    pub async fn get_all_hashtags(&self) -> Result<Vec<Hashtag>, AppError> {
        self.db.get_all_hashtags().await
    }

    /// Non-deleted tweets tagged with `label`, newest first
    ///
    /// # Errors
    /// `NotFound` if no hashtag has this exact label
    pub async fn get_tweets_by_hashtag(&self, label: &str) -> Result<Vec<TweetView>, AppError> {
        let hashtag = self
            .db
            .get_hashtag_by_label(label)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No hashtag found with label: {label}")))?;

        let tweets = self.db.get_tweets_by_hashtag(hashtag.id).await?;
        self.db.tweet_views(tweets).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::auth::{Credentials, hash_password};
    use crate::data::NewUser;
    use crate::service::TweetService;

    async fn setup() -> (HashtagService, TweetService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            Database::connect(&temp_dir.path().join("service-hashtag.db"))
                .await
                .unwrap(),
        );
        let hashed = hash_password("pw").unwrap();
        db.insert_user(&NewUser {
            username: "alice".to_string(),
            password_hash: hashed.hash,
            password_salt: hashed.salt,
        })
        .await
        .unwrap();

        (
            HashtagService::new(db.clone()),
            TweetService::new(db, 1000),
            temp_dir,
        )
    }

    fn alice() -> Option<Credentials> {
        Some(Credentials {
            username: "alice".to_string(),
            password: "pw".to_string(),
        })
    }

    #[tokio::test]
    async fn lists_hashtags_by_label() {
        let (hashtags, tweets, _temp_dir) = setup().await;
        tweets
            .create_tweet(Some("#zeta #alpha".to_string()), alice())
            .await
            .unwrap();
        tweets
            .create_tweet(Some("#alpha again".to_string()), alice())
            .await
            .unwrap();

        let labels: Vec<String> = hashtags
            .get_all_hashtags()
            .await
            .unwrap()
            .into_iter()
            .map(|tag| tag.label)
            .collect();
        assert_eq!(labels, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn tweets_by_hashtag_skip_deleted_and_are_newest_first() {
        let (hashtags, tweets, _temp_dir) = setup().await;
        let older = tweets
            .create_tweet(Some("first #rust".to_string()), alice())
            .await
            .unwrap();
        let doomed = tweets
            .create_tweet(Some("second #rust".to_string()), alice())
            .await
            .unwrap();
        let newer = tweets
            .create_tweet(Some("third #rust".to_string()), alice())
            .await
            .unwrap();
        tweets
            .create_tweet(Some("unrelated #go".to_string()), alice())
            .await
            .unwrap();
        tweets
            .delete_tweet(doomed.tweet.id, alice().as_ref().unwrap())
            .await
            .unwrap();

        let ids: Vec<i64> = hashtags
            .get_tweets_by_hashtag("rust")
            .await
            .unwrap()
            .iter()
            .map(|view| view.tweet.id)
            .collect();
        assert_eq!(ids, vec![newer.tweet.id, older.tweet.id]);
    }

    #[tokio::test]
    async fn unknown_label_is_not_found() {
        let (hashtags, _tweets, _temp_dir) = setup().await;

        let error = hashtags.get_tweets_by_hashtag("missing").await.unwrap_err();
        assert!(matches!(error, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn labels_are_case_sensitive() {
        let (hashtags, tweets, _temp_dir) = setup().await;
        tweets
            .create_tweet(Some("#Rust".to_string()), alice())
            .await
            .unwrap();

        assert!(hashtags.get_tweets_by_hashtag("rust").await.is_err());
        assert_eq!(hashtags.get_tweets_by_hashtag("Rust").await.unwrap().len(), 1);
    }
}

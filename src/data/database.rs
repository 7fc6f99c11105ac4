//! SQLite database operations
//!
//! All database access goes through this module.
//! Queries are built at runtime with `sqlx::query*` and bound parameters.

use chrono::Utc;
use sqlx::pool::PoolConnection;
use sqlx::{Pool, QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::path::Path;

use super::models::*;
use crate::error::AppError;

/// Database connection pool wrapper.
///
/// This is the persistence collaborator of the service layer: find-by-id,
/// find-by-username, find-by-label, find-all, save and the
/// relationship-filtered queries the services need.
pub struct Database {
    pool: Pool<Sqlite>,
    batch_size: usize,
}

/// Ids bound per `IN (...)` list; SQLite caps bind parameters per statement.
const DEFAULT_BATCH_SIZE: usize = 500;

impl Database {
    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self {
            pool,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Override how many ids each batched lookup binds at once
    #[cfg(test)]
    pub(crate) fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a user and return the stored row
    ///
    /// Fails with `BadRequest` if the username is taken.
    pub async fn insert_user(&self, user: &NewUser) -> Result<User, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, password_salt, deleted, joined)
            VALUES (?, ?, ?, 0, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.password_salt)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            let taken = matches!(
                &error,
                sqlx::Error::Database(db_error) if db_error.is_unique_violation()
            );
            if taken {
                AppError::BadRequest(format!("Username already taken: {}", user.username))
            } else {
                AppError::Database(error)
            }
        })?;

        self.get_user(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("inserted user row is missing")))
    }

    /// Get user by ID
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get user by exact username (deleted users included)
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Check whether any user row carries this username
    pub async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Set or clear a user's soft-delete flag
    pub async fn set_user_deleted(&self, id: i64, deleted: bool) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET deleted = ? WHERE id = ?")
            .bind(deleted)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_users_by_ids(&self, ids: &[i64]) -> Result<HashMap<i64, User>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut users = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(self.batch_size) {
            let mut query_builder =
                QueryBuilder::<Sqlite>::new("SELECT * FROM users WHERE id IN (");
            {
                let mut separated = query_builder.separated(", ");
                for id in chunk {
                    separated.push_bind(*id);
                }
            }
            query_builder.push(")");

            let rows = query_builder
                .build_query_as::<User>()
                .fetch_all(&self.pool)
                .await?;
            users.extend(rows.into_iter().map(|user| (user.id, user)));
        }

        Ok(users)
    }

    // =========================================================================
    // Tweets
    // =========================================================================

    /// Get tweet by ID (deleted tweets included)
    pub async fn get_tweet(&self, id: i64) -> Result<Option<Tweet>, AppError> {
        let tweet = sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tweet)
    }

    /// All non-deleted tweets, newest first
    pub async fn get_tweets_not_deleted(&self) -> Result<Vec<Tweet>, AppError> {
        let tweets = sqlx::query_as::<_, Tweet>(
            "SELECT * FROM tweets WHERE deleted = 0 ORDER BY posted DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tweets)
    }

    /// Direct replies to a tweet in creation order (deleted replies included)
    pub async fn get_replies(&self, parent_id: i64) -> Result<Vec<Tweet>, AppError> {
        let replies = sqlx::query_as::<_, Tweet>(
            "SELECT * FROM tweets WHERE in_reply_to = ? ORDER BY id ASC",
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(replies)
    }

    /// Non-deleted reposts of a tweet, newest first
    pub async fn get_reposts_not_deleted(&self, tweet_id: i64) -> Result<Vec<Tweet>, AppError> {
        let reposts = sqlx::query_as::<_, Tweet>(
            "SELECT * FROM tweets WHERE repost_of = ? AND deleted = 0 ORDER BY posted DESC, id DESC",
        )
        .bind(tweet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reposts)
    }

    /// Insert a tweet with its mentions and hashtags atomically.
    ///
    /// `mentions` are usernames; names with no matching user are skipped.
    /// `hashtags` are labels; a missing label creates the hashtag row, an
    /// existing one is reused and its `last_used` bumped. Everything happens
    /// inside one `BEGIN IMMEDIATE` transaction, so concurrent creation of the
    /// same label is serialized and the `UNIQUE(label)` constraint holds.
    pub async fn create_tweet(
        &self,
        tweet: &NewTweet,
        mentions: &[String],
        hashtags: &[String],
    ) -> Result<Tweet, AppError> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

        let result = Self::create_tweet_in_transaction(&mut conn, tweet, mentions, hashtags).await;

        match result {
            Ok((created, new_hashtags)) => {
                sqlx::query("COMMIT").execute(&mut *conn).await?;
                if new_hashtags > 0 {
                    crate::metrics::HASHTAGS_CREATED_TOTAL.inc_by(new_hashtags);
                }
                Ok(created)
            }
            Err(error) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(error)
            }
        }
    }

    async fn create_tweet_in_transaction(
        conn: &mut PoolConnection<Sqlite>,
        tweet: &NewTweet,
        mentions: &[String],
        hashtags: &[String],
    ) -> Result<(Tweet, u64), AppError> {
        let now = Utc::now();

        let inserted = sqlx::query(
            r#"
            INSERT INTO tweets (author_id, content, posted, deleted, in_reply_to, repost_of)
            VALUES (?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(tweet.author_id)
        .bind(&tweet.content)
        .bind(now)
        .bind(tweet.in_reply_to)
        .bind(tweet.repost_of)
        .execute(&mut **conn)
        .await?;
        let tweet_id = inserted.last_insert_rowid();

        for username in mentions {
            let user_id: Option<i64> =
                sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
                    .bind(username)
                    .fetch_optional(&mut **conn)
                    .await?;

            let Some(user_id) = user_id else {
                tracing::debug!(%username, tweet_id, "Skipping mention of unknown user");
                continue;
            };

            sqlx::query("INSERT OR IGNORE INTO tweet_mentions (tweet_id, user_id) VALUES (?, ?)")
                .bind(tweet_id)
                .bind(user_id)
                .execute(&mut **conn)
                .await?;
        }

        let mut new_hashtags = 0;
        for label in hashtags {
            let created = sqlx::query(
                "INSERT OR IGNORE INTO hashtags (label, first_used, last_used) VALUES (?, ?, ?)",
            )
            .bind(label)
            .bind(now)
            .bind(now)
            .execute(&mut **conn)
            .await?;

            if created.rows_affected() == 1 {
                new_hashtags += 1;
                tracing::debug!(%label, "Created hashtag");
            } else {
                sqlx::query("UPDATE hashtags SET last_used = ? WHERE label = ?")
                    .bind(now)
                    .bind(label)
                    .execute(&mut **conn)
                    .await?;
            }

            let hashtag_id: i64 = sqlx::query_scalar("SELECT id FROM hashtags WHERE label = ?")
                .bind(label)
                .fetch_one(&mut **conn)
                .await?;

            sqlx::query(
                "INSERT OR IGNORE INTO tweet_hashtags (tweet_id, hashtag_id) VALUES (?, ?)",
            )
            .bind(tweet_id)
            .bind(hashtag_id)
            .execute(&mut **conn)
            .await?;
        }

        let created = sqlx::query_as::<_, Tweet>("SELECT * FROM tweets WHERE id = ?")
            .bind(tweet_id)
            .fetch_one(&mut **conn)
            .await?;

        Ok((created, new_hashtags))
    }

    /// Set a tweet's soft-delete flag
    pub async fn set_tweet_deleted(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE tweets SET deleted = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    // =========================================================================
    // Likes / Mentions
    // =========================================================================

    /// Record a like
    ///
    /// # Returns
    /// `true` if a new like was stored, `false` if it already existed
    pub async fn insert_like(&self, user_id: i64, tweet_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO tweet_likes (user_id, tweet_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(tweet_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Users who liked a tweet, in like order (deleted users included)
    pub async fn get_liking_users(&self, tweet_id: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN tweet_likes l ON l.user_id = u.id
            WHERE l.tweet_id = ?
            ORDER BY l.created_at ASC, u.id ASC
            "#,
        )
        .bind(tweet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Tweets a user has liked, in like order
    pub async fn get_liked_tweets(&self, user_id: i64) -> Result<Vec<Tweet>, AppError> {
        let tweets = sqlx::query_as::<_, Tweet>(
            r#"
            SELECT t.* FROM tweets t
            JOIN tweet_likes l ON l.tweet_id = t.id
            WHERE l.user_id = ?
            ORDER BY l.created_at ASC, t.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tweets)
    }

    /// Users mentioned by a tweet (deleted users included)
    pub async fn get_mentioned_users(&self, tweet_id: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN tweet_mentions m ON m.user_id = u.id
            WHERE m.tweet_id = ?
            ORDER BY u.username ASC
            "#,
        )
        .bind(tweet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    // =========================================================================
    // Hashtags
    // =========================================================================

    /// All hashtags ordered by label
    pub async fn get_all_hashtags(&self) -> Result<Vec<Hashtag>, AppError> {
        let hashtags = sqlx::query_as::<_, Hashtag>("SELECT * FROM hashtags ORDER BY label ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(hashtags)
    }

    /// Get hashtag by exact label
    pub async fn get_hashtag_by_label(&self, label: &str) -> Result<Option<Hashtag>, AppError> {
        let hashtag = sqlx::query_as::<_, Hashtag>("SELECT * FROM hashtags WHERE label = ?")
            .bind(label)
            .fetch_optional(&self.pool)
            .await?;

        Ok(hashtag)
    }

    /// Hashtags attached to a tweet
    pub async fn get_tweet_hashtags(&self, tweet_id: i64) -> Result<Vec<Hashtag>, AppError> {
        let hashtags = sqlx::query_as::<_, Hashtag>(
            r#"
            SELECT h.* FROM hashtags h
            JOIN tweet_hashtags th ON th.hashtag_id = h.id
            WHERE th.tweet_id = ?
            ORDER BY th.rowid ASC
            "#,
        )
        .bind(tweet_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(hashtags)
    }

    /// Non-deleted tweets tagged with a hashtag, newest first
    pub async fn get_tweets_by_hashtag(&self, hashtag_id: i64) -> Result<Vec<Tweet>, AppError> {
        let tweets = sqlx::query_as::<_, Tweet>(
            r#"
            SELECT t.* FROM tweets t
            JOIN tweet_hashtags th ON th.tweet_id = t.id
            WHERE th.hashtag_id = ? AND t.deleted = 0
            ORDER BY t.posted DESC, t.id DESC
            "#,
        )
        .bind(hashtag_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tweets)
    }

    // =========================================================================
    // Views
    // =========================================================================

    /// Attach author, hashtag labels, mentions and like counts to tweets.
    ///
    /// Batched per relationship to avoid N+1 queries. Output order follows
    /// the input order.
    pub async fn tweet_views(&self, tweets: Vec<Tweet>) -> Result<Vec<TweetView>, AppError> {
        if tweets.is_empty() {
            return Ok(Vec::new());
        }

        let tweet_ids: Vec<i64> = tweets.iter().map(|tweet| tweet.id).collect();
        let mut author_ids: Vec<i64> = tweets.iter().map(|tweet| tweet.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors = self.get_users_by_ids(&author_ids).await?;
        let mut hashtags = self.get_hashtag_labels_batch(&tweet_ids).await?;
        let mut mentions = self.get_mention_usernames_batch(&tweet_ids).await?;
        let like_counts = self.get_like_counts_batch(&tweet_ids).await?;

        tweets
            .into_iter()
            .map(|tweet| {
                let author = authors.get(&tweet.author_id).cloned().ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "author {} of tweet {} is missing",
                        tweet.author_id,
                        tweet.id
                    ))
                })?;

                Ok(TweetView {
                    hashtags: hashtags.remove(&tweet.id).unwrap_or_default(),
                    mentions: mentions.remove(&tweet.id).unwrap_or_default(),
                    like_count: like_counts.get(&tweet.id).copied().unwrap_or(0),
                    author,
                    tweet,
                })
            })
            .collect()
    }

    /// Single-tweet convenience over [`Database::tweet_views`]
    pub async fn tweet_view(&self, tweet: Tweet) -> Result<TweetView, AppError> {
        self.tweet_views(vec![tweet])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("tweet view is missing")))
    }

    async fn get_hashtag_labels_batch(
        &self,
        tweet_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<String>>, AppError> {
        let mut labels: HashMap<i64, Vec<String>> = HashMap::new();
        for chunk in tweet_ids.chunks(self.batch_size) {
            let mut query_builder = QueryBuilder::<Sqlite>::new(
                "SELECT th.tweet_id, h.label FROM tweet_hashtags th JOIN hashtags h ON h.id = th.hashtag_id WHERE th.tweet_id IN (",
            );
            {
                let mut separated = query_builder.separated(", ");
                for id in chunk {
                    separated.push_bind(*id);
                }
            }
            query_builder.push(") ORDER BY th.rowid ASC");

            let rows = query_builder.build().fetch_all(&self.pool).await?;
            for row in rows {
                labels
                    .entry(row.try_get("tweet_id")?)
                    .or_default()
                    .push(row.try_get("label")?);
            }
        }

        Ok(labels)
    }

    async fn get_mention_usernames_batch(
        &self,
        tweet_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<String>>, AppError> {
        let mut usernames: HashMap<i64, Vec<String>> = HashMap::new();
        for chunk in tweet_ids.chunks(self.batch_size) {
            let mut query_builder = QueryBuilder::<Sqlite>::new(
                "SELECT m.tweet_id, u.username FROM tweet_mentions m JOIN users u ON u.id = m.user_id WHERE u.deleted = 0 AND m.tweet_id IN (",
            );
            {
                let mut separated = query_builder.separated(", ");
                for id in chunk {
                    separated.push_bind(*id);
                }
            }
            query_builder.push(") ORDER BY u.username ASC");

            let rows = query_builder.build().fetch_all(&self.pool).await?;
            for row in rows {
                usernames
                    .entry(row.try_get("tweet_id")?)
                    .or_default()
                    .push(row.try_get("username")?);
            }
        }

        Ok(usernames)
    }

    async fn get_like_counts_batch(&self, tweet_ids: &[i64]) -> Result<HashMap<i64, i64>, AppError> {
        let mut counts = HashMap::new();
        for chunk in tweet_ids.chunks(self.batch_size) {
            let mut query_builder = QueryBuilder::<Sqlite>::new(
                "SELECT l.tweet_id, COUNT(*) AS likes FROM tweet_likes l JOIN users u ON u.id = l.user_id WHERE u.deleted = 0 AND l.tweet_id IN (",
            );
            {
                let mut separated = query_builder.separated(", ");
                for id in chunk {
                    separated.push_bind(*id);
                }
            }
            query_builder.push(") GROUP BY l.tweet_id");

            let rows = query_builder.build().fetch_all(&self.pool).await?;
            for row in rows {
                counts.insert(row.try_get("tweet_id")?, row.try_get("likes")?);
            }
        }

        Ok(counts)
    }
}

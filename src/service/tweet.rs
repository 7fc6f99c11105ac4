//! Tweet service
//!
//! Handles the tweet lifecycle: create, reply, repost, soft-delete and like,
//! plus the read paths over a tweet's thread and relationships.

use std::collections::HashSet;
use std::sync::Arc;

use super::text::tokenize;
use crate::auth::{self, Credentials};
use crate::data::{Database, Hashtag, NewTweet, Tweet, TweetView, User};
use crate::error::AppError;
use crate::metrics::{LIKES_TOTAL, TWEETS_DELETED_TOTAL, TWEETS_TOTAL};

/// Ancestors and descendants of a tweet
#[derive(Debug, Clone)]
pub struct Context {
    /// Non-deleted ancestors, nearest first
    pub before: Vec<TweetView>,
    pub target: TweetView,
    /// Non-deleted direct replies, then their non-deleted replies
    pub after: Vec<TweetView>,
}

/// Tweet service
pub struct TweetService {
    db: Arc<Database>,
    max_depth: usize,
}

impl TweetService {
    /// Create new tweet service
    ///
    /// `max_depth` bounds how many levels thread walks follow.
    pub fn new(db: Arc<Database>, max_depth: usize) -> Self {
        Self { db, max_depth }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All non-deleted tweets, newest first
    pub async fn get_all_tweets(&self) -> Result<Vec<TweetView>, AppError> {
        let tweets = self.db.get_tweets_not_deleted().await?;
        self.db.tweet_views(tweets).await
    }

    /// Get tweet by ID, deleted or not
    pub async fn get_tweet(&self, id: i64) -> Result<TweetView, AppError> {
        let tweet = self
            .db
            .get_tweet(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No tweet found with id: {id}")))?;
        self.db.tweet_view(tweet).await
    }

    /// Thread context of a tweet
    ///
    /// `before` walks the reply chain upwards; deleted ancestors are skipped
    /// in the output but still walked through. `after` holds direct replies
    /// followed by replies to those replies (one extra level).
    pub async fn get_context(&self, id: i64) -> Result<Context, AppError> {
        let target = self.find_visible(id, "No tweet found with given ID").await?;

        let ancestors = self.walk_ancestors(&target).await?;
        let before: Vec<Tweet> = ancestors.into_iter().filter(|tweet| !tweet.deleted).collect();

        let replies = self.db.get_replies(target.id).await?;
        let mut descendants = replies.clone();
        for reply in &replies {
            descendants.extend(self.db.get_replies(reply.id).await?);
        }
        let after: Vec<Tweet> = descendants
            .into_iter()
            .filter(|tweet| !tweet.deleted)
            .collect();

        Ok(Context {
            before: self.db.tweet_views(before).await?,
            target: self.db.tweet_view(target).await?,
            after: self.db.tweet_views(after).await?,
        })
    }

    /// Every non-deleted descendant of a tweet, depth-first pre-order.
    ///
    /// A deleted reply hides its whole subtree.
    pub async fn get_reply_chain(&self, id: i64) -> Result<Vec<TweetView>, AppError> {
        let target = self.find_visible(id, "No tweet found with given ID").await?;

        let mut visited = HashSet::from([target.id]);
        let mut chain = Vec::new();
        let mut stack: Vec<(Tweet, usize)> = Vec::new();
        push_children(&mut stack, self.db.get_replies(target.id).await?, 1);

        while let Some((tweet, depth)) = stack.pop() {
            if !visited.insert(tweet.id) {
                tracing::warn!(tweet_id = tweet.id, "Reply chain revisits a tweet; skipping");
                continue;
            }

            let children = self.db.get_replies(tweet.id).await?;
            if depth < self.max_depth {
                push_children(&mut stack, children, depth + 1);
            } else if children.iter().any(|child| !child.deleted) {
                tracing::warn!(
                    root_id = id,
                    tweet_id = tweet.id,
                    max_depth = self.max_depth,
                    "Reply chain truncated at maximum depth"
                );
            }
            chain.push(tweet);
        }

        self.db.tweet_views(chain).await
    }

    /// Non-deleted direct replies
    pub async fn get_replies(&self, id: i64) -> Result<Vec<TweetView>, AppError> {
        let tweet = self.find_visible(id, "Tweet does not exist").await?;
        let replies: Vec<Tweet> = self
            .db
            .get_replies(tweet.id)
            .await?
            .into_iter()
            .filter(|reply| !reply.deleted)
            .collect();
        self.db.tweet_views(replies).await
    }

    /// Non-deleted users who liked a tweet
    pub async fn get_tweet_likes(&self, id: i64) -> Result<Vec<User>, AppError> {
        let tweet = self.find_visible(id, "Tweet does not exist").await?;
        let users = self.db.get_liking_users(tweet.id).await?;
        Ok(users.into_iter().filter(|user| !user.deleted).collect())
    }

    /// Hashtags attached to a tweet
    pub async fn get_tags(&self, id: i64) -> Result<Vec<Hashtag>, AppError> {
        let tweet = self
            .db
            .get_tweet(id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Tweet not found".to_string()))?;
        if tweet.deleted {
            return Err(AppError::NotFound("Tweet does not exist".to_string()));
        }
        self.db.get_tweet_hashtags(tweet.id).await
    }

    /// Non-deleted reposts of a tweet
    pub async fn get_tweet_reposts(&self, id: i64) -> Result<Vec<TweetView>, AppError> {
        let tweet = self.find_visible(id, "No tweet found with given ID").await?;
        let reposts = self.db.get_reposts_not_deleted(tweet.id).await?;
        self.db.tweet_views(reposts).await
    }

    /// Non-deleted users mentioned in a tweet
    pub async fn get_tweet_mentions(&self, id: i64) -> Result<Vec<User>, AppError> {
        let tweet = self.find_visible(id, "No tweet found with given ID").await?;
        let users = self.db.get_mentioned_users(tweet.id).await?;
        Ok(users.into_iter().filter(|user| !user.deleted).collect())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Create a new tweet
    ///
    /// # Errors
    /// - `BadRequest` if content is missing/blank or credentials are missing
    /// - `NotFound` if the username is unknown
    /// - `NotAuthorized` if the password does not match
    ///
    /// # Side Effects
    /// Persists the tweet, its mentions of existing users and its hashtags
    /// (creating unknown labels) in one transaction.
    pub async fn create_tweet(
        &self,
        content: Option<String>,
        credentials: Option<Credentials>,
    ) -> Result<TweetView, AppError> {
        let (content, credentials) = require_content_and_credentials(content, credentials)?;
        let author = self.authorize(&credentials).await?;

        let view = self.insert_with_tokens(author.id, content, None).await?;
        TWEETS_TOTAL.with_label_values(&["original"]).inc();
        tracing::info!(tweet_id = view.tweet.id, author = %author.username, "Tweet created");
        Ok(view)
    }

    /// Create a reply to an existing tweet
    ///
    /// Soft-deleted parents still accept replies.
    pub async fn create_reply_to_tweet(
        &self,
        parent_id: i64,
        content: Option<String>,
        credentials: Option<Credentials>,
    ) -> Result<TweetView, AppError> {
        let (content, credentials) = require_content_and_credentials(content, credentials)?;
        let parent = self
            .db
            .get_tweet(parent_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No tweet found with id: {parent_id}")))?;
        let author = self.authorize(&credentials).await?;

        let view = self
            .insert_with_tokens(author.id, content, Some(parent.id))
            .await?;
        TWEETS_TOTAL.with_label_values(&["reply"]).inc();
        tracing::info!(
            tweet_id = view.tweet.id,
            in_reply_to = parent.id,
            author = %author.username,
            "Reply created"
        );
        Ok(view)
    }

    /// Soft-delete a tweet
    ///
    /// Only the author may delete; the returned view carries `deleted = true`.
    /// Deleting an already deleted tweet changes nothing.
    pub async fn delete_tweet(
        &self,
        id: i64,
        credentials: &Credentials,
    ) -> Result<TweetView, AppError> {
        let mut tweet = self.db.get_tweet(id).await?.ok_or_else(|| {
            AppError::NotFound("No tweet found for that ID, cannot delete".to_string())
        })?;

        let requester = self.authorize(credentials).await?;
        if requester.id != tweet.author_id {
            return Err(AppError::NotAuthorized(
                "Only the author can delete this tweet".to_string(),
            ));
        }

        if tweet.deleted {
            tracing::debug!(tweet_id = tweet.id, "Tweet already deleted");
            return self.db.tweet_view(tweet).await;
        }

        self.db.set_tweet_deleted(tweet.id).await?;
        tweet.deleted = true;
        TWEETS_DELETED_TOTAL.inc();
        tracing::info!(tweet_id = tweet.id, "Tweet deleted");

        self.db.tweet_view(tweet).await
    }

    /// Like a tweet
    ///
    /// Liking a tweet twice is a silent no-op.
    pub async fn like_tweet(&self, id: i64, credentials: &Credentials) -> Result<(), AppError> {
        let tweet = self
            .find_visible(id, "No tweet found for that ID, cannot like")
            .await?;
        let user = self.authorize(credentials).await?;

        if self.db.insert_like(user.id, tweet.id).await? {
            LIKES_TOTAL.inc();
            tracing::info!(tweet_id = tweet.id, user = %user.username, "Tweet liked");
        } else {
            tracing::debug!(tweet_id = tweet.id, user = %user.username, "Tweet already liked");
        }

        Ok(())
    }

    /// Repost a tweet as the authorized user
    ///
    /// The repost has no content of its own.
    pub async fn repost_tweet(
        &self,
        id: i64,
        credentials: &Credentials,
    ) -> Result<TweetView, AppError> {
        let user = self.authorize(credentials).await?;

        let original = self
            .db
            .get_tweet(id)
            .await?
            .ok_or_else(|| AppError::BadRequest("Tweet not found".to_string()))?;

        let repost = self
            .db
            .create_tweet(
                &NewTweet {
                    author_id: user.id,
                    content: None,
                    in_reply_to: None,
                    repost_of: Some(original.id),
                },
                &[],
                &[],
            )
            .await?;
        TWEETS_TOTAL.with_label_values(&["repost"]).inc();
        tracing::info!(tweet_id = repost.id, repost_of = original.id, user = %user.username, "Tweet reposted");

        self.db.tweet_view(repost).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Resolve the acting user and check their password.
    ///
    /// Soft-deleted accounts are treated as unknown.
    async fn authorize(&self, credentials: &Credentials) -> Result<User, AppError> {
        let user = self
            .db
            .get_user_by_username(&credentials.username)
            .await?
            .filter(|user| !user.deleted);
        auth::authorize(user, credentials)
    }

    async fn find_visible(&self, id: i64, message: &str) -> Result<Tweet, AppError> {
        match self.db.get_tweet(id).await? {
            Some(tweet) if !tweet.deleted => Ok(tweet),
            _ => Err(AppError::NotFound(message.to_string())),
        }
    }

    async fn insert_with_tokens(
        &self,
        author_id: i64,
        content: String,
        in_reply_to: Option<i64>,
    ) -> Result<TweetView, AppError> {
        let tokens = tokenize(&content);
        let tweet = self
            .db
            .create_tweet(
                &NewTweet {
                    author_id,
                    content: Some(content),
                    in_reply_to,
                    repost_of: None,
                },
                &tokens.mentions,
                &tokens.hashtags,
            )
            .await?;
        self.db.tweet_view(tweet).await
    }

    /// Ancestors nearest first, bounded by `max_depth` and cycle-checked.
    async fn walk_ancestors(&self, tweet: &Tweet) -> Result<Vec<Tweet>, AppError> {
        let mut visited = HashSet::from([tweet.id]);
        let mut ancestors = Vec::new();
        let mut next = tweet.in_reply_to;

        while let Some(parent_id) = next {
            if ancestors.len() >= self.max_depth {
                tracing::warn!(
                    tweet_id = tweet.id,
                    max_depth = self.max_depth,
                    "Ancestor walk truncated at maximum depth"
                );
                break;
            }
            if !visited.insert(parent_id) {
                tracing::warn!(tweet_id = tweet.id, parent_id, "Reply cycle detected");
                break;
            }

            let Some(parent) = self.db.get_tweet(parent_id).await? else {
                break;
            };
            next = parent.in_reply_to;
            ancestors.push(parent);
        }

        Ok(ancestors)
    }
}

fn require_content_and_credentials(
    content: Option<String>,
    credentials: Option<Credentials>,
) -> Result<(String, Credentials), AppError> {
    match (content, credentials) {
        (Some(content), Some(credentials)) if !content.trim().is_empty() => {
            Ok((content, credentials))
        }
        _ => Err(AppError::BadRequest(
            "Please provide content and credentials".to_string(),
        )),
    }
}

/// Push non-deleted children so the first child is popped first.
fn push_children(stack: &mut Vec<(Tweet, usize)>, children: Vec<Tweet>, depth: usize) {
    stack.extend(
        children
            .into_iter()
            .filter(|child| !child.deleted)
            .rev()
            .map(|child| (child, depth)),
    );
}

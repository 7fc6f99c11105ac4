//! Database tests

use super::*;
use crate::error::AppError;
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

async fn insert_user(db: &Database, username: &str) -> User {
    db.insert_user(&NewUser {
        username: username.to_string(),
        password_hash: "hash".to_string(),
        password_salt: "salt".to_string(),
    })
    .await
    .unwrap()
}

fn new_tweet(author_id: i64, content: &str) -> NewTweet {
    NewTweet {
        author_id,
        content: Some(content.to_string()),
        in_reply_to: None,
        repost_of: None,
    }
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
}

#[tokio::test]
async fn test_user_insert_and_lookup() {
    let (db, _temp_dir) = create_test_db().await;

    let user = insert_user(&db, "alice").await;
    assert!(!user.deleted);

    let by_id = db.get_user(user.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, "alice");

    let by_name = db.get_user_by_username("alice").await.unwrap().unwrap();
    assert_eq!(by_name.id, user.id);

    assert!(db.get_user_by_username("ALICE").await.unwrap().is_none());
    assert!(db.username_exists("alice").await.unwrap());
    assert!(!db.username_exists("bob").await.unwrap());
}

#[tokio::test]
async fn test_duplicate_username_is_bad_request() {
    let (db, _temp_dir) = create_test_db().await;
    insert_user(&db, "alice").await;

    let error = db
        .insert_user(&NewUser {
            username: "alice".to_string(),
            password_hash: "other".to_string(),
            password_salt: "other".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(error, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_tweet_crud() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = insert_user(&db, "alice").await;

    let tweet = db
        .create_tweet(&new_tweet(alice.id, "Hello, world!"), &[], &[])
        .await
        .unwrap();
    assert_eq!(tweet.content.as_deref(), Some("Hello, world!"));
    assert!(!tweet.deleted);

    let retrieved = db.get_tweet(tweet.id).await.unwrap().unwrap();
    assert_eq!(retrieved, tweet);

    db.set_tweet_deleted(tweet.id).await.unwrap();
    let deleted = db.get_tweet(tweet.id).await.unwrap().unwrap();
    assert!(deleted.deleted);
    assert!(db.get_tweets_not_deleted().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_tweet_links_mentions_and_hashtags() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = insert_user(&db, "alice").await;
    insert_user(&db, "bob").await;

    let tweet = db
        .create_tweet(
            &new_tweet(alice.id, "hi @bob @ghost #one #two"),
            &["bob".to_string(), "ghost".to_string()],
            &["one".to_string(), "two".to_string()],
        )
        .await
        .unwrap();

    let mentioned = db.get_mentioned_users(tweet.id).await.unwrap();
    assert_eq!(mentioned.len(), 1);
    assert_eq!(mentioned[0].username, "bob");

    let labels: Vec<String> = db
        .get_tweet_hashtags(tweet.id)
        .await
        .unwrap()
        .into_iter()
        .map(|tag| tag.label)
        .collect();
    assert_eq!(labels, vec!["one", "two"]);
}

#[tokio::test]
async fn test_hashtag_reuse_bumps_last_used() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = insert_user(&db, "alice").await;
    let label = vec!["shared".to_string()];

    db.create_tweet(&new_tweet(alice.id, "#shared"), &[], &label)
        .await
        .unwrap();
    let first = db.get_hashtag_by_label("shared").await.unwrap().unwrap();

    let second_tweet = db
        .create_tweet(&new_tweet(alice.id, "#shared again"), &[], &label)
        .await
        .unwrap();
    let second = db.get_hashtag_by_label("shared").await.unwrap().unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.first_used, first.first_used);
    assert!(second.last_used >= first.last_used);
    assert_eq!(db.get_all_hashtags().await.unwrap().len(), 1);

    let tagged = db.get_tweets_by_hashtag(second.id).await.unwrap();
    assert_eq!(tagged.len(), 2);
    assert_eq!(tagged[0].id, second_tweet.id);
}

#[tokio::test]
async fn test_concurrent_creation_of_same_label_yields_one_hashtag() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = insert_user(&db, "alice").await;
    let db = std::sync::Arc::new(db);

    let mut handles = Vec::new();
    for i in 0..8 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            db.create_tweet(
                &new_tweet(alice.id, &format!("race {i} #race")),
                &[],
                &["race".to_string()],
            )
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let hashtags = db.get_all_hashtags().await.unwrap();
    assert_eq!(hashtags.len(), 1);
    assert_eq!(
        db.get_tweets_by_hashtag(hashtags[0].id).await.unwrap().len(),
        8
    );
}

#[tokio::test]
async fn test_likes_are_unique_per_user_and_tweet() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = insert_user(&db, "alice").await;
    let bob = insert_user(&db, "bob").await;
    let tweet = db
        .create_tweet(&new_tweet(alice.id, "likeable"), &[], &[])
        .await
        .unwrap();

    assert!(db.insert_like(bob.id, tweet.id).await.unwrap());
    assert!(!db.insert_like(bob.id, tweet.id).await.unwrap());

    assert_eq!(db.get_liking_users(tweet.id).await.unwrap().len(), 1);
    let liked = db.get_liked_tweets(bob.id).await.unwrap();
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].id, tweet.id);
    assert!(db.get_liked_tweets(alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_replies_and_reposts_by_parent() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = insert_user(&db, "alice").await;
    let parent = db
        .create_tweet(&new_tweet(alice.id, "parent"), &[], &[])
        .await
        .unwrap();

    let mut reply = new_tweet(alice.id, "reply");
    reply.in_reply_to = Some(parent.id);
    let reply = db.create_tweet(&reply, &[], &[]).await.unwrap();

    let repost = NewTweet {
        author_id: alice.id,
        content: None,
        in_reply_to: None,
        repost_of: Some(parent.id),
    };
    let repost = db.create_tweet(&repost, &[], &[]).await.unwrap();
    let deleted_repost = db
        .create_tweet(
            &NewTweet {
                author_id: alice.id,
                content: None,
                in_reply_to: None,
                repost_of: Some(parent.id),
            },
            &[],
            &[],
        )
        .await
        .unwrap();
    db.set_tweet_deleted(deleted_repost.id).await.unwrap();

    let replies = db.get_replies(parent.id).await.unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].id, reply.id);

    let reposts = db.get_reposts_not_deleted(parent.id).await.unwrap();
    assert_eq!(reposts.len(), 1);
    assert_eq!(reposts[0].id, repost.id);
    assert!(reposts[0].content.is_none());
}

#[tokio::test]
async fn test_tweet_views_preserve_order_and_relationships() {
    let (db, _temp_dir) = create_test_db().await;
    let alice = insert_user(&db, "alice").await;
    let bob = insert_user(&db, "bob").await;

    let first = db
        .create_tweet(
            &new_tweet(alice.id, "@bob #a"),
            &["bob".to_string()],
            &["a".to_string()],
        )
        .await
        .unwrap();
    let second = db
        .create_tweet(&new_tweet(bob.id, "plain"), &[], &[])
        .await
        .unwrap();
    db.insert_like(bob.id, first.id).await.unwrap();
    db.insert_like(alice.id, first.id).await.unwrap();

    let views = db
        .tweet_views(vec![second.clone(), first.clone()])
        .await
        .unwrap();
    assert_eq!(views.len(), 2);

    assert_eq!(views[0].tweet.id, second.id);
    assert_eq!(views[0].author.username, "bob");
    assert!(views[0].hashtags.is_empty());
    assert_eq!(views[0].like_count, 0);

    assert_eq!(views[1].tweet.id, first.id);
    assert_eq!(views[1].author.username, "alice");
    assert_eq!(views[1].hashtags, vec!["a"]);
    assert_eq!(views[1].mentions, vec!["bob"]);
    assert_eq!(views[1].like_count, 2);

    db.set_user_deleted(alice.id, true).await.unwrap();
    let view = db.tweet_view(first).await.unwrap();
    assert_eq!(view.like_count, 1);
}

#[tokio::test]
async fn test_tweet_views_span_several_batches() {
    let (db, _temp_dir) = create_test_db().await;
    let db = db.with_batch_size(3);
    let alice = insert_user(&db, "alice").await;
    let bob = insert_user(&db, "bob").await;
    let carol = insert_user(&db, "carol").await;
    let authors = [&alice, &bob, &carol];

    for i in 0..10 {
        let author = authors[i % authors.len()];
        let tweet = db
            .create_tweet(
                &new_tweet(author.id, &format!("tweet {i} @bob #batch")),
                &["bob".to_string()],
                &["batch".to_string()],
            )
            .await
            .unwrap();
        db.insert_like(alice.id, tweet.id).await.unwrap();
    }

    let tweets = db.get_tweets_not_deleted().await.unwrap();
    let expected: Vec<i64> = tweets.iter().map(|tweet| tweet.id).collect();
    let views = db.tweet_views(tweets).await.unwrap();

    assert_eq!(views.len(), 10);
    assert_eq!(
        views.iter().map(|view| view.tweet.id).collect::<Vec<_>>(),
        expected
    );
    for view in &views {
        assert_eq!(view.author.id, view.tweet.author_id);
        assert_eq!(view.hashtags, vec!["batch"]);
        assert_eq!(view.mentions, vec!["bob"]);
        assert_eq!(view.like_count, 1);
    }
}

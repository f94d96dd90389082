//! Persistence boundary for users, tweets, follow edges and likes.
//!
//! Services only ever talk to an [`EntityStore`] handed to them at
//! construction. Two implementations exist: [`SeaOrmStore`] over a real
//! database and [`MemoryStore`], an in-process arena used by the tests.
//!
//! Uniqueness (username, email, follow edge, like edge) is enforced here and
//! reported as [`StoreError::Duplicate`]; callers may pre-check but the store
//! is the authority. Every list is ordered newest first and windowed by
//! [`Page`].

pub mod memory;
pub mod sea;

pub use memory::MemoryStore;
pub use sea::SeaOrmStore;

use crate::entities::{tweet, user};
use crate::error::{StoreError, StoreResult};
use crate::models::Page;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
    pub bio: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTweet {
    pub author_id: i64,
    pub content: String,
    pub image_url: Option<String>,
}

/// Mutable profile fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub bio: Option<Option<String>>,
    pub profile_image_url: Option<String>,
}

/// A tweet joined with its author and current like count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TweetRow {
    pub tweet: tweet::Model,
    pub author: user::Model,
    pub like_count: u64,
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    // users
    async fn create_user(&self, new_user: NewUser) -> StoreResult<user::Model>;
    async fn find_user(&self, id: i64) -> StoreResult<Option<user::Model>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<user::Model>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<user::Model>>;
    async fn update_user(
        &self,
        id: i64,
        changes: ProfileChanges,
    ) -> StoreResult<Option<user::Model>>;

    // tweets
    async fn create_tweet(&self, new_tweet: NewTweet) -> StoreResult<tweet::Model>;
    async fn find_tweet(&self, id: i64) -> StoreResult<Option<TweetRow>>;
    async fn replace_tweet(
        &self,
        id: i64,
        content: String,
        image_url: Option<String>,
    ) -> StoreResult<Option<tweet::Model>>;
    /// Deletes the tweet together with every like that references it.
    async fn delete_tweet(&self, id: i64) -> StoreResult<u64>;
    async fn tweets_by_author(&self, author_id: i64, page: Page) -> StoreResult<Vec<TweetRow>>;
    /// Tweets written by `viewer_id` or by anyone `viewer_id` follows.
    async fn timeline(&self, viewer_id: i64, page: Page) -> StoreResult<Vec<TweetRow>>;

    // follow edges
    async fn create_follow(&self, follower_id: i64, following_id: i64) -> StoreResult<()>;
    async fn delete_follow(&self, follower_id: i64, following_id: i64) -> StoreResult<u64>;
    async fn follow_exists(&self, follower_id: i64, following_id: i64) -> StoreResult<bool>;
    async fn followers(&self, user_id: i64, page: Page) -> StoreResult<Vec<user::Model>>;
    async fn following(&self, user_id: i64, page: Page) -> StoreResult<Vec<user::Model>>;
    async fn count_followers(&self, user_id: i64) -> StoreResult<u64>;
    async fn count_following(&self, user_id: i64) -> StoreResult<u64>;

    // likes
    async fn create_like(&self, user_id: i64, tweet_id: i64) -> StoreResult<()>;
    async fn delete_like(&self, user_id: i64, tweet_id: i64) -> StoreResult<u64>;
    async fn like_exists(&self, user_id: i64, tweet_id: i64) -> StoreResult<bool>;
    async fn count_likes(&self, tweet_id: i64) -> StoreResult<u64>;
    /// Subset of `tweet_ids` that `user_id` has liked.
    async fn liked_among(&self, user_id: i64, tweet_ids: &[i64]) -> StoreResult<HashSet<i64>>;
    /// Tweets liked by `user_id`, most recent like first.
    async fn liked_tweets(&self, user_id: i64, page: Page) -> StoreResult<Vec<TweetRow>>;
}

/// Stitches tweets, their authors and like counts into rows, preserving tweet order.
pub(crate) fn assemble_rows(
    tweets: Vec<(tweet::Model, Option<user::Model>)>,
    like_counts: &HashMap<i64, u64>,
) -> StoreResult<Vec<TweetRow>> {
    tweets
        .into_iter()
        .map(|(tweet, author)| {
            let author = author.ok_or_else(|| {
                StoreError::Internal(format!("tweet {} has no author row", tweet.id))
            })?;
            let like_count = like_counts.get(&tweet.id).copied().unwrap_or(0);
            Ok(TweetRow {
                tweet,
                author,
                like_count,
            })
        })
        .collect()
}

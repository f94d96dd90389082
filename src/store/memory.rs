use super::{EntityStore, NewTweet, NewUser, ProfileChanges, TweetRow};
use crate::entities::{follow, like, tweet, user};
use crate::error::{Reference, StoreError, StoreResult, UniqueKey};
use crate::models::Page;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// In-process [`EntityStore`]: an arena of rows keyed by id behind one lock.
///
/// Every write checks its uniqueness and foreign-key constraints while holding
/// the lock, mirroring the database schema.
#[derive(Default)]
pub struct MemoryStore {
    arena: Mutex<Arena>,
}

#[derive(Default)]
struct Arena {
    last_user_id: i64,
    last_tweet_id: i64,
    last_timestamp: Option<DateTime<Utc>>,
    users: BTreeMap<i64, user::Model>,
    tweets: BTreeMap<i64, tweet::Model>,
    follows: BTreeMap<(i64, i64), follow::Model>,
    likes: BTreeMap<(i64, i64), like::Model>,
}

impl Arena {
    /// Strictly increasing creation times so ordering never ties.
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    fn row(&self, tweet: &tweet::Model) -> StoreResult<TweetRow> {
        let author = self.users.get(&tweet.author_id).cloned().ok_or_else(|| {
            StoreError::Internal(format!("tweet {} has no author row", tweet.id))
        })?;
        let like_count = self
            .likes
            .values()
            .filter(|like| like.tweet_id == tweet.id)
            .count() as u64;
        Ok(TweetRow {
            tweet: tweet.clone(),
            author,
            like_count,
        })
    }

    /// Newest first, ties broken by id, then windowed.
    fn page_of_tweets<'a>(
        &self,
        tweets: impl Iterator<Item = &'a tweet::Model>,
        page: Page,
    ) -> StoreResult<Vec<TweetRow>> {
        let mut tweets: Vec<&tweet::Model> = tweets.collect();
        tweets.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        window(tweets, page)
            .into_iter()
            .map(|tweet| self.row(tweet))
            .collect()
    }

    fn users_by_edges<'a>(
        &self,
        edges: impl Iterator<Item = (&'a follow::Model, i64)>,
        page: Page,
    ) -> Vec<user::Model> {
        let mut edges: Vec<(&follow::Model, i64)> = edges.collect();
        edges.sort_by(|(a, a_id), (b, b_id)| (b.created_at, *b_id).cmp(&(a.created_at, *a_id)));
        window(edges, page)
            .into_iter()
            .filter_map(|(_, user_id)| self.users.get(&user_id).cloned())
            .collect()
    }
}

fn window<T>(items: Vec<T>, page: Page) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn arena(&self) -> StoreResult<MutexGuard<'_, Arena>> {
        self.arena
            .lock()
            .map_err(|_| StoreError::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<user::Model> {
        let mut arena = self.arena()?;
        if arena.users.values().any(|u| u.username == new_user.username) {
            return Err(StoreError::Duplicate(UniqueKey::Username));
        }
        if arena.users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::Duplicate(UniqueKey::Email));
        }

        arena.last_user_id += 1;
        let now = arena.now();
        let model = user::Model {
            id: arena.last_user_id,
            username: new_user.username,
            display_name: new_user.display_name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            bio: new_user.bio,
            profile_image_url: None,
            created_at: now,
            updated_at: now,
        };
        arena.users.insert(model.id, model.clone());
        Ok(model)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<user::Model>> {
        Ok(self.arena()?.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<user::Model>> {
        let arena = self.arena()?;
        Ok(arena.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<user::Model>> {
        let arena = self.arena()?;
        Ok(arena.users.values().find(|u| u.username == username).cloned())
    }

    async fn update_user(
        &self,
        id: i64,
        changes: ProfileChanges,
    ) -> StoreResult<Option<user::Model>> {
        let mut arena = self.arena()?;
        let now = arena.now();
        let Some(existing) = arena.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(display_name) = changes.display_name {
            existing.display_name = display_name;
        }
        if let Some(bio) = changes.bio {
            existing.bio = bio;
        }
        if let Some(url) = changes.profile_image_url {
            existing.profile_image_url = Some(url);
        }
        existing.updated_at = now;
        Ok(Some(existing.clone()))
    }

    async fn create_tweet(&self, new_tweet: NewTweet) -> StoreResult<tweet::Model> {
        let mut arena = self.arena()?;
        if !arena.users.contains_key(&new_tweet.author_id) {
            return Err(StoreError::MissingReference(Reference::User));
        }
        arena.last_tweet_id += 1;
        let now = arena.now();
        let model = tweet::Model {
            id: arena.last_tweet_id,
            author_id: new_tweet.author_id,
            content: new_tweet.content,
            image_url: new_tweet.image_url,
            created_at: now,
            updated_at: now,
        };
        arena.tweets.insert(model.id, model.clone());
        Ok(model)
    }

    async fn find_tweet(&self, id: i64) -> StoreResult<Option<TweetRow>> {
        let arena = self.arena()?;
        arena.tweets.get(&id).map(|tweet| arena.row(tweet)).transpose()
    }

    async fn replace_tweet(
        &self,
        id: i64,
        content: String,
        image_url: Option<String>,
    ) -> StoreResult<Option<tweet::Model>> {
        let mut arena = self.arena()?;
        let now = arena.now();
        let Some(existing) = arena.tweets.get_mut(&id) else {
            return Ok(None);
        };
        existing.content = content;
        existing.image_url = image_url;
        existing.updated_at = now;
        Ok(Some(existing.clone()))
    }

    async fn delete_tweet(&self, id: i64) -> StoreResult<u64> {
        let mut arena = self.arena()?;
        arena.likes.retain(|(_, tweet_id), _| *tweet_id != id);
        Ok(arena.tweets.remove(&id).map_or(0, |_| 1))
    }

    async fn tweets_by_author(&self, author_id: i64, page: Page) -> StoreResult<Vec<TweetRow>> {
        let arena = self.arena()?;
        arena.page_of_tweets(
            arena.tweets.values().filter(|t| t.author_id == author_id),
            page,
        )
    }

    async fn timeline(&self, viewer_id: i64, page: Page) -> StoreResult<Vec<TweetRow>> {
        let arena = self.arena()?;
        let authors: HashSet<i64> = arena
            .follows
            .keys()
            .filter(|(follower, _)| *follower == viewer_id)
            .map(|(_, following)| *following)
            .chain(std::iter::once(viewer_id))
            .collect();
        arena.page_of_tweets(
            arena
                .tweets
                .values()
                .filter(|t| authors.contains(&t.author_id)),
            page,
        )
    }

    async fn create_follow(&self, follower_id: i64, following_id: i64) -> StoreResult<()> {
        let mut arena = self.arena()?;
        if !arena.users.contains_key(&follower_id) || !arena.users.contains_key(&following_id) {
            return Err(StoreError::MissingReference(Reference::User));
        }
        if arena.follows.contains_key(&(follower_id, following_id)) {
            return Err(StoreError::Duplicate(UniqueKey::FollowEdge));
        }
        let created_at = arena.now();
        arena.follows.insert(
            (follower_id, following_id),
            follow::Model {
                follower_id,
                following_id,
                created_at,
            },
        );
        Ok(())
    }

    async fn delete_follow(&self, follower_id: i64, following_id: i64) -> StoreResult<u64> {
        let mut arena = self.arena()?;
        Ok(arena
            .follows
            .remove(&(follower_id, following_id))
            .map_or(0, |_| 1))
    }

    async fn follow_exists(&self, follower_id: i64, following_id: i64) -> StoreResult<bool> {
        Ok(self
            .arena()?
            .follows
            .contains_key(&(follower_id, following_id)))
    }

    async fn followers(&self, user_id: i64, page: Page) -> StoreResult<Vec<user::Model>> {
        let arena = self.arena()?;
        Ok(arena.users_by_edges(
            arena
                .follows
                .values()
                .filter(|edge| edge.following_id == user_id)
                .map(|edge| (edge, edge.follower_id)),
            page,
        ))
    }

    async fn following(&self, user_id: i64, page: Page) -> StoreResult<Vec<user::Model>> {
        let arena = self.arena()?;
        Ok(arena.users_by_edges(
            arena
                .follows
                .values()
                .filter(|edge| edge.follower_id == user_id)
                .map(|edge| (edge, edge.following_id)),
            page,
        ))
    }

    async fn count_followers(&self, user_id: i64) -> StoreResult<u64> {
        let arena = self.arena()?;
        Ok(arena
            .follows
            .keys()
            .filter(|(_, following)| *following == user_id)
            .count() as u64)
    }

    async fn count_following(&self, user_id: i64) -> StoreResult<u64> {
        let arena = self.arena()?;
        Ok(arena
            .follows
            .keys()
            .filter(|(follower, _)| *follower == user_id)
            .count() as u64)
    }

    async fn create_like(&self, user_id: i64, tweet_id: i64) -> StoreResult<()> {
        let mut arena = self.arena()?;
        if !arena.users.contains_key(&user_id) {
            return Err(StoreError::MissingReference(Reference::User));
        }
        if !arena.tweets.contains_key(&tweet_id) {
            return Err(StoreError::MissingReference(Reference::Tweet));
        }
        if arena.likes.contains_key(&(user_id, tweet_id)) {
            return Err(StoreError::Duplicate(UniqueKey::LikeEdge));
        }
        let created_at = arena.now();
        arena.likes.insert(
            (user_id, tweet_id),
            like::Model {
                user_id,
                tweet_id,
                created_at,
            },
        );
        Ok(())
    }

    async fn delete_like(&self, user_id: i64, tweet_id: i64) -> StoreResult<u64> {
        let mut arena = self.arena()?;
        Ok(arena.likes.remove(&(user_id, tweet_id)).map_or(0, |_| 1))
    }

    async fn like_exists(&self, user_id: i64, tweet_id: i64) -> StoreResult<bool> {
        Ok(self.arena()?.likes.contains_key(&(user_id, tweet_id)))
    }

    async fn count_likes(&self, tweet_id: i64) -> StoreResult<u64> {
        let arena = self.arena()?;
        Ok(arena
            .likes
            .keys()
            .filter(|(_, liked)| *liked == tweet_id)
            .count() as u64)
    }

    async fn liked_among(&self, user_id: i64, tweet_ids: &[i64]) -> StoreResult<HashSet<i64>> {
        let arena = self.arena()?;
        Ok(tweet_ids
            .iter()
            .copied()
            .filter(|tweet_id| arena.likes.contains_key(&(user_id, *tweet_id)))
            .collect())
    }

    async fn liked_tweets(&self, user_id: i64, page: Page) -> StoreResult<Vec<TweetRow>> {
        let arena = self.arena()?;
        let mut likes: Vec<&like::Model> = arena
            .likes
            .values()
            .filter(|like| like.user_id == user_id)
            .collect();
        likes.sort_by(|a, b| (b.created_at, b.tweet_id).cmp(&(a.created_at, a.tweet_id)));
        window(likes, page)
            .into_iter()
            .filter_map(|like| arena.tweets.get(&like.tweet_id))
            .map(|tweet| arena.row(tweet))
            .collect()
    }
}

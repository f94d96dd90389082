use crate::error::{AppError, AppResult};
use crate::models::{Page, TweetResponse};
use crate::store::EntityStore;
use std::collections::HashSet;
use std::sync::Arc;

/// Likes on tweets and the viewer-relative `is_liked` flag.
#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn EntityStore>,
}

impl EngagementService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        EngagementService { store }
    }

    /// Not idempotent: liking twice is `AlreadyLiked`.
    pub async fn like(&self, user_id: i64, tweet_id: i64) -> AppResult<()> {
        if self.store.find_tweet(tweet_id).await?.is_none() {
            return Err(AppError::TweetNotFound);
        }
        if self.store.like_exists(user_id, tweet_id).await? {
            return Err(AppError::AlreadyLiked);
        }

        self.store.create_like(user_id, tweet_id).await?;
        log::info!("User {} liked tweet {}", user_id, tweet_id);
        Ok(())
    }

    pub async fn unlike(&self, user_id: i64, tweet_id: i64) -> AppResult<()> {
        if !self.store.like_exists(user_id, tweet_id).await? {
            return Err(AppError::NotLiked);
        }
        if self.store.delete_like(user_id, tweet_id).await? == 0 {
            return Err(AppError::NotLiked);
        }
        log::info!("User {} unliked tweet {}", user_id, tweet_id);
        Ok(())
    }

    pub async fn is_liked(&self, user_id: i64, tweet_id: i64) -> AppResult<bool> {
        Ok(self.store.like_exists(user_id, tweet_id).await?)
    }

    pub async fn like_count(&self, tweet_id: i64) -> AppResult<u64> {
        Ok(self.store.count_likes(tweet_id).await?)
    }

    /// Which of `tweet_ids` the viewer has liked. Anonymous viewers like nothing.
    pub async fn liked_by_viewer(
        &self,
        viewer_id: Option<i64>,
        tweet_ids: &[i64],
    ) -> AppResult<HashSet<i64>> {
        match viewer_id {
            Some(viewer_id) if viewer_id != 0 && !tweet_ids.is_empty() => {
                Ok(self.store.liked_among(viewer_id, tweet_ids).await?)
            }
            _ => Ok(HashSet::new()),
        }
    }

    /// Most recently liked first, each with author and like count.
    pub async fn list_liked_tweets(
        &self,
        user_id: i64,
        page: Page,
    ) -> AppResult<Vec<TweetResponse>> {
        let rows = self.store.liked_tweets(user_id, page).await?;
        Ok(rows.into_iter().map(TweetResponse::from).collect())
    }
}

use crate::error::{AppError, AppResult};
use crate::models::{Page, UserResponse};
use crate::store::EntityStore;
use std::sync::Arc;

/// Directed follow edges between users.
#[derive(Clone)]
pub struct GraphService {
    store: Arc<dyn EntityStore>,
}

impl GraphService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        GraphService { store }
    }

    /// Not idempotent: following twice is `AlreadyFollowing`.
    pub async fn follow(&self, follower_id: i64, following_id: i64) -> AppResult<()> {
        if follower_id == following_id {
            return Err(AppError::SelfFollow);
        }
        if self.store.find_user(following_id).await?.is_none() {
            return Err(AppError::UserNotFound);
        }
        if self.store.follow_exists(follower_id, following_id).await? {
            return Err(AppError::AlreadyFollowing);
        }

        self.store.create_follow(follower_id, following_id).await?;
        log::info!("User {} followed user {}", follower_id, following_id);
        Ok(())
    }

    pub async fn unfollow(&self, follower_id: i64, following_id: i64) -> AppResult<()> {
        if !self.store.follow_exists(follower_id, following_id).await? {
            return Err(AppError::NotFollowing);
        }

        // A concurrent unfollow may win between the check and the delete.
        if self.store.delete_follow(follower_id, following_id).await? == 0 {
            return Err(AppError::NotFollowing);
        }
        log::info!("User {} unfollowed user {}", follower_id, following_id);
        Ok(())
    }

    pub async fn list_followers(&self, user_id: i64, page: Page) -> AppResult<Vec<UserResponse>> {
        let users = self.store.followers(user_id, page).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn list_following(&self, user_id: i64, page: Page) -> AppResult<Vec<UserResponse>> {
        let users = self.store.following(user_id, page).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn followers_count(&self, user_id: i64) -> AppResult<u64> {
        Ok(self.store.count_followers(user_id).await?)
    }

    pub async fn following_count(&self, user_id: i64) -> AppResult<u64> {
        Ok(self.store.count_following(user_id).await?)
    }
}

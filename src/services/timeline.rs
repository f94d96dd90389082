use crate::error::{AppError, AppResult};
use crate::models::{Page, TweetResponse, TweetView};
use crate::services::EngagementService;
use crate::store::{EntityStore, NewTweet, TweetRow};
use std::sync::Arc;

pub const MAX_TWEET_CHARS: usize = 280;

/// Over-long content is rejected, never truncated.
pub fn validate_content(content: &str) -> AppResult<()> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("content must not be empty".to_string()));
    }
    let chars = content.chars().count();
    if chars > MAX_TWEET_CHARS {
        return Err(AppError::Validation(format!(
            "content is {} characters, the limit is {}",
            chars, MAX_TWEET_CHARS
        )));
    }
    Ok(())
}

fn normalize_image_url(image_url: Option<String>) -> Option<String> {
    image_url.filter(|url| !url.trim().is_empty())
}

/// Composes tweets into viewer-scoped feeds.
#[derive(Clone)]
pub struct TimelineService {
    store: Arc<dyn EntityStore>,
    engagement: EngagementService,
}

impl TimelineService {
    pub fn new(store: Arc<dyn EntityStore>, engagement: EngagementService) -> Self {
        TimelineService { store, engagement }
    }

    pub async fn create_tweet(
        &self,
        author_id: i64,
        content: String,
        image_url: Option<String>,
    ) -> AppResult<TweetResponse> {
        validate_content(&content)?;
        let author = self
            .store
            .find_user(author_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let tweet = self
            .store
            .create_tweet(NewTweet {
                author_id,
                content,
                image_url: normalize_image_url(image_url),
            })
            .await?;

        log::info!("User {} posted tweet {}", author_id, tweet.id);
        Ok(TweetRow {
            tweet,
            author,
            like_count: 0,
        }
        .into())
    }

    pub async fn get_tweet(&self, tweet_id: i64, viewer_id: Option<i64>) -> AppResult<TweetView> {
        let row = self
            .store
            .find_tweet(tweet_id)
            .await?
            .ok_or(AppError::TweetNotFound)?;
        let mut views = self.annotate(viewer_id, vec![row]).await?;
        views.pop().ok_or(AppError::TweetNotFound)
    }

    pub async fn get_user_tweets(
        &self,
        author_id: i64,
        viewer_id: Option<i64>,
        page: Page,
    ) -> AppResult<Vec<TweetView>> {
        let rows = self.store.tweets_by_author(author_id, page).await?;
        self.annotate(viewer_id, rows).await
    }

    /// The viewer's own tweets plus those of everyone they follow, newest first.
    pub async fn get_timeline(&self, viewer_id: i64, page: Page) -> AppResult<Vec<TweetView>> {
        let rows = self.store.timeline(viewer_id, page).await?;
        self.annotate(Some(viewer_id), rows).await
    }

    /// Full replacement of content and image by the author.
    pub async fn update_tweet(
        &self,
        tweet_id: i64,
        requester_id: i64,
        content: String,
        image_url: Option<String>,
    ) -> AppResult<TweetView> {
        validate_content(&content)?;
        self.owned_tweet(tweet_id, requester_id).await?;

        self.store
            .replace_tweet(tweet_id, content, normalize_image_url(image_url))
            .await?
            .ok_or(AppError::TweetNotFound)?;
        self.get_tweet(tweet_id, Some(requester_id)).await
    }

    /// Removes the tweet and every like on it.
    pub async fn delete_tweet(&self, tweet_id: i64, requester_id: i64) -> AppResult<()> {
        self.owned_tweet(tweet_id, requester_id).await?;

        if self.store.delete_tweet(tweet_id).await? == 0 {
            return Err(AppError::TweetNotFound);
        }
        log::info!("User {} deleted tweet {}", requester_id, tweet_id);
        Ok(())
    }

    async fn owned_tweet(&self, tweet_id: i64, requester_id: i64) -> AppResult<TweetRow> {
        let row = self
            .store
            .find_tweet(tweet_id)
            .await?
            .ok_or(AppError::TweetNotFound)?;
        if row.tweet.author_id != requester_id {
            log::debug!(
                "User {} may not modify tweet {} owned by {}",
                requester_id,
                tweet_id,
                row.tweet.author_id
            );
            return Err(AppError::NotOwner);
        }
        Ok(row)
    }

    async fn annotate(
        &self,
        viewer_id: Option<i64>,
        rows: Vec<TweetRow>,
    ) -> AppResult<Vec<TweetView>> {
        let ids: Vec<i64> = rows.iter().map(|row| row.tweet.id).collect();
        let liked = self.engagement.liked_by_viewer(viewer_id, &ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let is_liked = liked.contains(&row.tweet.id);
                TweetView {
                    tweet: row.into(),
                    is_liked,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_280_characters() {
        let content = "あ".repeat(MAX_TWEET_CHARS);
        assert!(validate_content(&content).is_ok());
    }

    #[test]
    fn rejects_281_characters() {
        let content = "x".repeat(MAX_TWEET_CHARS + 1);
        assert!(matches!(
            validate_content(&content),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn rejects_blank_content() {
        assert!(validate_content("   ").is_err());
        assert!(validate_content("").is_err());
    }

    #[test]
    fn blank_image_url_is_dropped() {
        assert_eq!(normalize_image_url(Some("  ".into())), None);
        assert_eq!(
            normalize_image_url(Some("https://img/1.png".into())),
            Some("https://img/1.png".into())
        );
    }
}

use crate::models::AuthorSummary;
use crate::store::TweetRow;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct TweetResponse {
    pub id: i64,
    pub author_id: i64,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub author: AuthorSummary,
    pub like_count: u64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<TweetRow> for TweetResponse {
    fn from(row: TweetRow) -> Self {
        TweetResponse {
            id: row.tweet.id,
            author_id: row.tweet.author_id,
            content: row.tweet.content,
            image_url: row.tweet.image_url,
            author: row.author.into(),
            like_count: row.like_count,
            created_at: row.tweet.created_at,
            updated_at: row.tweet.updated_at,
        }
    }
}

/// A tweet as seen by one particular viewer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TweetView {
    pub tweet: TweetResponse,
    pub is_liked: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTweetRequest {
    pub content: String,
    pub image_url: Option<String>,
}

/// Full replacement of a tweet's body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateTweetRequest {
    pub content: String,
    pub image_url: Option<String>,
}

use super::{assemble_rows, EntityStore, NewTweet, NewUser, ProfileChanges, TweetRow};
use crate::entities::{follow, like, tweet, user};
use crate::error::{Reference, StoreError, StoreResult, UniqueKey};
use crate::models::Page;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
    TransactionTrait,
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;

/// [`EntityStore`] over a sea-orm connection (MySQL in production, SQLite in tests).
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
    timeout: Duration,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        SeaOrmStore { db, timeout }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Runs one store call under the configured deadline. Expiry drops the
    /// in-flight query.
    async fn bounded<T, F>(&self, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>> + Send,
        T: Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("Store call exceeded {:?}", self.timeout);
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}

/// Message of a unique/primary-key violation, if `err` is one.
fn unique_violation(err: &DbErr) -> Option<String> {
    if let Some(SqlErr::UniqueConstraintViolation(msg)) = err.sql_err() {
        return Some(msg);
    }
    let msg = err.to_string();
    if msg.contains("UNIQUE constraint failed") || msg.contains("Duplicate entry") {
        Some(msg)
    } else {
        None
    }
}

/// Which users constraint fired. MySQL reports `... for key 'users.email'`,
/// SQLite `UNIQUE constraint failed: users.email`.
fn user_unique_key(msg: &str) -> UniqueKey {
    let constraint = msg
        .rsplit_once("for key")
        .or_else(|| msg.rsplit_once("failed:"))
        .map(|(_, key)| key)
        .unwrap_or(msg);
    if constraint.contains("email") {
        UniqueKey::Email
    } else {
        UniqueKey::Username
    }
}

/// Whether `err` is a foreign-key rejection. SQLite reports
/// `FOREIGN KEY constraint failed`, MySQL `a foreign key constraint fails`.
fn foreign_key_violation(err: &DbErr) -> bool {
    if let Some(SqlErr::ForeignKeyConstraintViolation(_)) = err.sql_err() {
        return true;
    }
    let msg = err.to_string();
    msg.contains("FOREIGN KEY constraint failed")
        || msg.contains("foreign key constraint fails")
}

/// `missing` names the referenced row that can vanish under a concurrent
/// delete; SQLite does not say which key failed.
fn edge_insert_error(err: DbErr, key: UniqueKey, missing: Reference) -> StoreError {
    if unique_violation(&err).is_some() {
        StoreError::Duplicate(key)
    } else if foreign_key_violation(&err) {
        StoreError::MissingReference(missing)
    } else {
        StoreError::Database(err)
    }
}

async fn like_counts(
    db: &DatabaseConnection,
    tweet_ids: &[i64],
) -> StoreResult<HashMap<i64, u64>> {
    if tweet_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let counts: Vec<(i64, i64)> = like::Entity::find()
        .select_only()
        .column(like::Column::TweetId)
        .column_as(Expr::col(like::Column::UserId).count(), "like_count")
        .filter(like::Column::TweetId.is_in(tweet_ids.iter().copied()))
        .group_by(like::Column::TweetId)
        .into_tuple()
        .all(db)
        .await?;
    Ok(counts
        .into_iter()
        .map(|(tweet_id, count)| (tweet_id, count.max(0) as u64))
        .collect())
}

async fn into_rows(
    db: &DatabaseConnection,
    tweets: Vec<(tweet::Model, Option<user::Model>)>,
) -> StoreResult<Vec<TweetRow>> {
    let ids: Vec<i64> = tweets.iter().map(|(tweet, _)| tweet.id).collect();
    let counts = like_counts(db, &ids).await?;
    assemble_rows(tweets, &counts)
}

#[async_trait]
impl EntityStore for SeaOrmStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<user::Model> {
        let db = &self.db;
        self.bounded(async move {
            let now = Utc::now();
            let model = user::ActiveModel {
                username: Set(new_user.username),
                display_name: Set(new_user.display_name),
                email: Set(new_user.email),
                password_hash: Set(new_user.password_hash),
                bio: Set(new_user.bio),
                profile_image_url: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            model.insert(db).await.map_err(|err| match unique_violation(&err) {
                Some(msg) => StoreError::Duplicate(user_unique_key(&msg)),
                None => StoreError::Database(err),
            })
        })
        .await
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<user::Model>> {
        let db = &self.db;
        self.bounded(async move { Ok(user::Entity::find_by_id(id).one(db).await?) })
            .await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<user::Model>> {
        let db = &self.db;
        self.bounded(async move {
            Ok(user::Entity::find()
                .filter(user::Column::Email.eq(email))
                .one(db)
                .await?)
        })
        .await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<user::Model>> {
        let db = &self.db;
        self.bounded(async move {
            Ok(user::Entity::find()
                .filter(user::Column::Username.eq(username))
                .one(db)
                .await?)
        })
        .await
    }

    async fn update_user(
        &self,
        id: i64,
        changes: ProfileChanges,
    ) -> StoreResult<Option<user::Model>> {
        let db = &self.db;
        self.bounded(async move {
            let Some(existing) = user::Entity::find_by_id(id).one(db).await? else {
                return Ok(None);
            };
            let mut model: user::ActiveModel = existing.into();
            if let Some(display_name) = changes.display_name {
                model.display_name = Set(display_name);
            }
            if let Some(bio) = changes.bio {
                model.bio = Set(bio);
            }
            if let Some(url) = changes.profile_image_url {
                model.profile_image_url = Set(Some(url));
            }
            model.updated_at = Set(Utc::now());
            Ok(Some(model.update(db).await?))
        })
        .await
    }

    async fn create_tweet(&self, new_tweet: NewTweet) -> StoreResult<tweet::Model> {
        let db = &self.db;
        self.bounded(async move {
            let now = Utc::now();
            let model = tweet::ActiveModel {
                author_id: Set(new_tweet.author_id),
                content: Set(new_tweet.content),
                image_url: Set(new_tweet.image_url),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            model.insert(db).await.map_err(|err| {
                if foreign_key_violation(&err) {
                    StoreError::MissingReference(Reference::User)
                } else {
                    StoreError::Database(err)
                }
            })
        })
        .await
    }

    async fn find_tweet(&self, id: i64) -> StoreResult<Option<TweetRow>> {
        let db = &self.db;
        self.bounded(async move {
            let found = tweet::Entity::find_by_id(id)
                .find_also_related(user::Entity)
                .one(db)
                .await?;
            match found {
                Some(pair) => Ok(into_rows(db, vec![pair]).await?.pop()),
                None => Ok(None),
            }
        })
        .await
    }

    async fn replace_tweet(
        &self,
        id: i64,
        content: String,
        image_url: Option<String>,
    ) -> StoreResult<Option<tweet::Model>> {
        let db = &self.db;
        self.bounded(async move {
            let Some(existing) = tweet::Entity::find_by_id(id).one(db).await? else {
                return Ok(None);
            };
            let mut model: tweet::ActiveModel = existing.into();
            model.content = Set(content);
            model.image_url = Set(image_url);
            model.updated_at = Set(Utc::now());
            Ok(Some(model.update(db).await?))
        })
        .await
    }

    async fn delete_tweet(&self, id: i64) -> StoreResult<u64> {
        let db = &self.db;
        self.bounded(async move {
            let txn = db.begin().await?;
            like::Entity::delete_many()
                .filter(like::Column::TweetId.eq(id))
                .exec(&txn)
                .await?;
            let result = tweet::Entity::delete_by_id(id).exec(&txn).await?;
            txn.commit().await?;
            Ok(result.rows_affected)
        })
        .await
    }

    async fn tweets_by_author(&self, author_id: i64, page: Page) -> StoreResult<Vec<TweetRow>> {
        let db = &self.db;
        self.bounded(async move {
            let tweets = tweet::Entity::find()
                .filter(tweet::Column::AuthorId.eq(author_id))
                .order_by_desc(tweet::Column::CreatedAt)
                .order_by_desc(tweet::Column::Id)
                .find_also_related(user::Entity)
                .limit(page.limit)
                .offset(page.offset)
                .all(db)
                .await?;
            into_rows(db, tweets).await
        })
        .await
    }

    async fn timeline(&self, viewer_id: i64, page: Page) -> StoreResult<Vec<TweetRow>> {
        let db = &self.db;
        self.bounded(async move {
            let followees = Query::select()
                .column(follow::Column::FollowingId)
                .from(follow::Entity)
                .and_where(follow::Column::FollowerId.eq(viewer_id))
                .to_owned();

            let tweets = tweet::Entity::find()
                .filter(
                    Condition::any()
                        .add(tweet::Column::AuthorId.eq(viewer_id))
                        .add(tweet::Column::AuthorId.in_subquery(followees)),
                )
                .order_by_desc(tweet::Column::CreatedAt)
                .order_by_desc(tweet::Column::Id)
                .find_also_related(user::Entity)
                .limit(page.limit)
                .offset(page.offset)
                .all(db)
                .await?;
            into_rows(db, tweets).await
        })
        .await
    }

    async fn create_follow(&self, follower_id: i64, following_id: i64) -> StoreResult<()> {
        let db = &self.db;
        self.bounded(async move {
            let edge = follow::ActiveModel {
                follower_id: Set(follower_id),
                following_id: Set(following_id),
                created_at: Set(Utc::now()),
            };
            follow::Entity::insert(edge)
                .exec_without_returning(db)
                .await
                .map_err(|err| edge_insert_error(err, UniqueKey::FollowEdge, Reference::User))?;
            Ok(())
        })
        .await
    }

    async fn delete_follow(&self, follower_id: i64, following_id: i64) -> StoreResult<u64> {
        let db = &self.db;
        self.bounded(async move {
            let result = follow::Entity::delete_many()
                .filter(follow::Column::FollowerId.eq(follower_id))
                .filter(follow::Column::FollowingId.eq(following_id))
                .exec(db)
                .await?;
            Ok(result.rows_affected)
        })
        .await
    }

    async fn follow_exists(&self, follower_id: i64, following_id: i64) -> StoreResult<bool> {
        let db = &self.db;
        self.bounded(async move {
            let edge = follow::Entity::find_by_id((follower_id, following_id))
                .one(db)
                .await?;
            Ok(edge.is_some())
        })
        .await
    }

    async fn followers(&self, user_id: i64, page: Page) -> StoreResult<Vec<user::Model>> {
        let db = &self.db;
        self.bounded(async move {
            Ok(user::Entity::find()
                .join(JoinType::InnerJoin, follow::Relation::Follower.def().rev())
                .filter(follow::Column::FollowingId.eq(user_id))
                .order_by_desc(follow::Column::CreatedAt)
                .order_by_desc(user::Column::Id)
                .limit(page.limit)
                .offset(page.offset)
                .all(db)
                .await?)
        })
        .await
    }

    async fn following(&self, user_id: i64, page: Page) -> StoreResult<Vec<user::Model>> {
        let db = &self.db;
        self.bounded(async move {
            Ok(user::Entity::find()
                .join(JoinType::InnerJoin, follow::Relation::Following.def().rev())
                .filter(follow::Column::FollowerId.eq(user_id))
                .order_by_desc(follow::Column::CreatedAt)
                .order_by_desc(user::Column::Id)
                .limit(page.limit)
                .offset(page.offset)
                .all(db)
                .await?)
        })
        .await
    }

    async fn count_followers(&self, user_id: i64) -> StoreResult<u64> {
        let db = &self.db;
        self.bounded(async move {
            Ok(follow::Entity::find()
                .filter(follow::Column::FollowingId.eq(user_id))
                .count(db)
                .await?)
        })
        .await
    }

    async fn count_following(&self, user_id: i64) -> StoreResult<u64> {
        let db = &self.db;
        self.bounded(async move {
            Ok(follow::Entity::find()
                .filter(follow::Column::FollowerId.eq(user_id))
                .count(db)
                .await?)
        })
        .await
    }

    async fn create_like(&self, user_id: i64, tweet_id: i64) -> StoreResult<()> {
        let db = &self.db;
        self.bounded(async move {
            let edge = like::ActiveModel {
                user_id: Set(user_id),
                tweet_id: Set(tweet_id),
                created_at: Set(Utc::now()),
            };
            like::Entity::insert(edge)
                .exec_without_returning(db)
                .await
                .map_err(|err| edge_insert_error(err, UniqueKey::LikeEdge, Reference::Tweet))?;
            Ok(())
        })
        .await
    }

    async fn delete_like(&self, user_id: i64, tweet_id: i64) -> StoreResult<u64> {
        let db = &self.db;
        self.bounded(async move {
            let result = like::Entity::delete_many()
                .filter(like::Column::UserId.eq(user_id))
                .filter(like::Column::TweetId.eq(tweet_id))
                .exec(db)
                .await?;
            Ok(result.rows_affected)
        })
        .await
    }

    async fn like_exists(&self, user_id: i64, tweet_id: i64) -> StoreResult<bool> {
        let db = &self.db;
        self.bounded(async move {
            let edge = like::Entity::find_by_id((user_id, tweet_id)).one(db).await?;
            Ok(edge.is_some())
        })
        .await
    }

    async fn count_likes(&self, tweet_id: i64) -> StoreResult<u64> {
        let db = &self.db;
        self.bounded(async move {
            Ok(like::Entity::find()
                .filter(like::Column::TweetId.eq(tweet_id))
                .count(db)
                .await?)
        })
        .await
    }

    async fn liked_among(&self, user_id: i64, tweet_ids: &[i64]) -> StoreResult<HashSet<i64>> {
        if tweet_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let db = &self.db;
        self.bounded(async move {
            let likes = like::Entity::find()
                .filter(like::Column::UserId.eq(user_id))
                .filter(like::Column::TweetId.is_in(tweet_ids.iter().copied()))
                .all(db)
                .await?;
            Ok(likes.into_iter().map(|like| like.tweet_id).collect())
        })
        .await
    }

    async fn liked_tweets(&self, user_id: i64, page: Page) -> StoreResult<Vec<TweetRow>> {
        let db = &self.db;
        self.bounded(async move {
            let tweets = tweet::Entity::find()
                .join(JoinType::InnerJoin, tweet::Relation::Likes.def())
                .filter(like::Column::UserId.eq(user_id))
                .order_by_desc(like::Column::CreatedAt)
                .order_by_desc(tweet::Column::Id)
                .find_also_related(user::Entity)
                .limit(page.limit)
                .offset(page.offset)
                .all(db)
                .await?;
            into_rows(db, tweets).await
        })
        .await
    }
}

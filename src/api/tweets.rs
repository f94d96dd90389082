use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{CreateTweetRequest, Page, PageQuery, UpdateTweetRequest};
use crate::services::{EngagementService, TimelineService};
use actix_web::{web, HttpResponse};

#[utoipa::path(
    post,
    path = "/api/tweets",
    request_body = CreateTweetRequest,
    responses(
        (status = 201, description = "Tweet created", body = TweetResponse),
        (status = 400, description = "Empty content or over 280 characters"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "tweets"
)]
pub async fn create_tweet(
    req: web::Json<CreateTweetRequest>,
    user: AuthenticatedUser,
    timeline: web::Data<TimelineService>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let tweet = timeline
        .create_tweet(user.user_id, req.content, req.image_url)
        .await?;
    Ok(HttpResponse::Created().json(tweet))
}

#[utoipa::path(
    get,
    path = "/api/tweets/{tweet_id}",
    params(("tweet_id" = i64, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Tweet with the viewer's like state", body = TweetView),
        (status = 404, description = "Tweet not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tweets"
)]
pub async fn get_tweet(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    timeline: web::Data<TimelineService>,
) -> Result<HttpResponse, AppError> {
    let tweet = timeline
        .get_tweet(path.into_inner(), Some(user.user_id))
        .await?;
    Ok(HttpResponse::Ok().json(tweet))
}

#[utoipa::path(
    put,
    path = "/api/tweets/{tweet_id}",
    params(("tweet_id" = i64, Path, description = "Tweet ID")),
    request_body = UpdateTweetRequest,
    responses(
        (status = 200, description = "Tweet replaced", body = TweetView),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Tweet not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tweets"
)]
pub async fn update_tweet(
    path: web::Path<i64>,
    req: web::Json<UpdateTweetRequest>,
    user: AuthenticatedUser,
    timeline: web::Data<TimelineService>,
) -> Result<HttpResponse, AppError> {
    let req = req.into_inner();
    let tweet = timeline
        .update_tweet(path.into_inner(), user.user_id, req.content, req.image_url)
        .await?;
    Ok(HttpResponse::Ok().json(tweet))
}

#[utoipa::path(
    delete,
    path = "/api/tweets/{tweet_id}",
    params(("tweet_id" = i64, Path, description = "Tweet ID")),
    responses(
        (status = 204, description = "Tweet deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Tweet not found")
    ),
    security(("bearer_auth" = [])),
    tag = "tweets"
)]
pub async fn delete_tweet(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    timeline: web::Data<TimelineService>,
) -> Result<HttpResponse, AppError> {
    timeline
        .delete_tweet(path.into_inner(), user.user_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    post,
    path = "/api/tweets/{tweet_id}/like",
    params(("tweet_id" = i64, Path, description = "Tweet ID")),
    responses(
        (status = 204, description = "Tweet liked"),
        (status = 404, description = "Tweet not found"),
        (status = 409, description = "Already liked")
    ),
    security(("bearer_auth" = [])),
    tag = "tweets"
)]
pub async fn like_tweet(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    engagement: web::Data<EngagementService>,
) -> Result<HttpResponse, AppError> {
    engagement.like(user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/api/tweets/{tweet_id}/like",
    params(("tweet_id" = i64, Path, description = "Tweet ID")),
    responses(
        (status = 204, description = "Like removed"),
        (status = 404, description = "Tweet was not liked")
    ),
    security(("bearer_auth" = [])),
    tag = "tweets"
)]
pub async fn unlike_tweet(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    engagement: web::Data<EngagementService>,
) -> Result<HttpResponse, AppError> {
    engagement.unlike(user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    get,
    path = "/api/timeline",
    params(PageQuery),
    responses(
        (status = 200, description = "Home timeline, newest first", body = Vec<TweetView>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "tweets"
)]
pub async fn get_timeline(
    query: web::Query<PageQuery>,
    user: AuthenticatedUser,
    timeline: web::Data<TimelineService>,
) -> Result<HttpResponse, AppError> {
    let tweets = timeline
        .get_timeline(user.user_id, Page::from(&*query))
        .await?;
    Ok(HttpResponse::Ok().json(tweets))
}

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::models::{Page, PageQuery, UpdateProfileImageRequest, UpdateProfileRequest};
use crate::services::{EngagementService, GraphService, IdentityService, TimelineService};
use actix_web::{web, HttpResponse};

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile with follow counts", body = UserProfile),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_profile(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    identity: web::Data<IdentityService>,
) -> Result<HttpResponse, AppError> {
    let profile = identity
        .get_profile(path.into_inner(), Some(user.user_id))
        .await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Bad request")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_profile(
    req: web::Json<UpdateProfileRequest>,
    user: AuthenticatedUser,
    identity: web::Data<IdentityService>,
) -> Result<HttpResponse, AppError> {
    let updated = identity
        .update_profile(user.user_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    put,
    path = "/api/users/me/image",
    request_body = UpdateProfileImageRequest,
    responses(
        (status = 200, description = "Profile image updated", body = UserResponse),
        (status = 400, description = "Bad request")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_profile_image(
    req: web::Json<UpdateProfileImageRequest>,
    user: AuthenticatedUser,
    identity: web::Data<IdentityService>,
) -> Result<HttpResponse, AppError> {
    let updated = identity
        .update_profile_image(user.user_id, req.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/tweets",
    params(("user_id" = i64, Path, description = "Author ID"), PageQuery),
    responses(
        (status = 200, description = "Tweets by the user, newest first", body = Vec<TweetView>)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user_tweets(
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
    user: AuthenticatedUser,
    timeline: web::Data<TimelineService>,
) -> Result<HttpResponse, AppError> {
    let tweets = timeline
        .get_user_tweets(path.into_inner(), Some(user.user_id), Page::from(&*query))
        .await?;
    Ok(HttpResponse::Ok().json(tweets))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/followers",
    params(("user_id" = i64, Path, description = "User ID"), PageQuery),
    responses(
        (status = 200, description = "Followers, most recent first", body = Vec<UserResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_followers(
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
    _user: AuthenticatedUser,
    graph: web::Data<GraphService>,
) -> Result<HttpResponse, AppError> {
    let users = graph
        .list_followers(path.into_inner(), Page::from(&*query))
        .await?;
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/following",
    params(("user_id" = i64, Path, description = "User ID"), PageQuery),
    responses(
        (status = 200, description = "Followed users, newest first", body = Vec<UserResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_following(
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
    _user: AuthenticatedUser,
    graph: web::Data<GraphService>,
) -> Result<HttpResponse, AppError> {
    let users = graph
        .list_following(path.into_inner(), Page::from(&*query))
        .await?;
    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}/likes",
    params(("user_id" = i64, Path, description = "User ID"), PageQuery),
    responses(
        (status = 200, description = "Liked tweets, latest like first", body = Vec<TweetResponse>)
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_liked_tweets(
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
    _user: AuthenticatedUser,
    engagement: web::Data<EngagementService>,
) -> Result<HttpResponse, AppError> {
    let tweets = engagement
        .list_liked_tweets(path.into_inner(), Page::from(&*query))
        .await?;
    Ok(HttpResponse::Ok().json(tweets))
}

#[utoipa::path(
    post,
    path = "/api/users/{user_id}/follow",
    params(("user_id" = i64, Path, description = "User to follow")),
    responses(
        (status = 204, description = "Now following"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Already following, or following yourself")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn follow(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    graph: web::Data<GraphService>,
) -> Result<HttpResponse, AppError> {
    graph.follow(user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[utoipa::path(
    delete,
    path = "/api/users/{user_id}/follow",
    params(("user_id" = i64, Path, description = "User to unfollow")),
    responses(
        (status = 204, description = "Unfollowed"),
        (status = 404, description = "Not following")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn unfollow(
    path: web::Path<i64>,
    user: AuthenticatedUser,
    graph: web::Data<GraphService>,
) -> Result<HttpResponse, AppError> {
    graph.unfollow(user.user_id, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

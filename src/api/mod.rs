pub mod auth;
pub mod tweets;
pub mod users;

use crate::error::AppError;
use crate::models::{
    AuthResponse, AuthorSummary, CreateTweetRequest, LoginRequest, PageQuery, RegisterRequest,
    TweetResponse, TweetView, UpdateProfileImageRequest, UpdateProfileRequest, UpdateTweetRequest,
    UserProfile, UserResponse,
};
use crate::services::Services;
use actix_web::web;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth endpoints
        auth::register,
        auth::login,
        // User and graph endpoints
        users::get_profile,
        users::update_profile,
        users::update_profile_image,
        users::get_user_tweets,
        users::get_followers,
        users::get_following,
        users::get_liked_tweets,
        users::follow,
        users::unfollow,
        // Tweet endpoints
        tweets::create_tweet,
        tweets::get_tweet,
        tweets::update_tweet,
        tweets::delete_tweet,
        tweets::like_tweet,
        tweets::unlike_tweet,
        tweets::get_timeline,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        UserResponse,
        UserProfile,
        UpdateProfileRequest,
        UpdateProfileImageRequest,
        AuthorSummary,
        TweetResponse,
        TweetView,
        CreateTweetRequest,
        UpdateTweetRequest,
        PageQuery,
    )),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "Profiles and the follow graph"),
        (name = "tweets", description = "Tweets, likes and the home timeline"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

use utoipa::Modify;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

/// Registers the services and every `/api` route on an app.
pub fn configure(services: Services) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(
            web::JsonConfig::default()
                .error_handler(|err, _| AppError::Validation(err.to_string()).into()),
        )
        .app_data(
            web::QueryConfig::default()
                .error_handler(|err, _| AppError::Validation(err.to_string()).into()),
        )
        .app_data(web::Data::new(services.identity))
        .app_data(web::Data::new(services.graph))
        .app_data(web::Data::new(services.engagement))
        .app_data(web::Data::new(services.timeline))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login)),
                )
                .service(
                    web::scope("/users")
                        .route("/me", web::put().to(users::update_profile))
                        .route("/me/image", web::put().to(users::update_profile_image))
                        .route("/{user_id}", web::get().to(users::get_profile))
                        .route("/{user_id}/tweets", web::get().to(users::get_user_tweets))
                        .route("/{user_id}/followers", web::get().to(users::get_followers))
                        .route("/{user_id}/following", web::get().to(users::get_following))
                        .route("/{user_id}/likes", web::get().to(users::get_liked_tweets))
                        .route("/{user_id}/follow", web::post().to(users::follow))
                        .route("/{user_id}/follow", web::delete().to(users::unfollow)),
                )
                .service(
                    web::scope("/tweets")
                        .route("", web::post().to(tweets::create_tweet))
                        .route("/{tweet_id}", web::get().to(tweets::get_tweet))
                        .route("/{tweet_id}", web::put().to(tweets::update_tweet))
                        .route("/{tweet_id}", web::delete().to(tweets::delete_tweet))
                        .route("/{tweet_id}/like", web::post().to(tweets::like_tweet))
                        .route("/{tweet_id}/like", web::delete().to(tweets::unlike_tweet)),
                )
                .route("/timeline", web::get().to(tweets::get_timeline)),
        );
    }
}

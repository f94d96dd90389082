// Integration tests for the HTTP surface, served over the in-memory store.
// Run with: cargo test --test api_test

use actix_web::{http::StatusCode, test, App};
use serde_json::{json, Value};
use social_graph_service::{
    api,
    config::Config,
    models::{AuthResponse, TweetResponse, TweetView, UserProfile, UserResponse},
    services::Services,
    store::{EntityStore, MemoryStore},
};
use std::sync::Arc;

/// Helper function to create a test app
fn create_test_app() -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let mut config = Config::from_env().expect("Failed to load configuration");
    config.password.bcrypt_cost = 4;
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());

    App::new().configure(api::configure(Services::new(store, &config)))
}

/// Registers `name` and returns `(user_id, token)`.
macro_rules! register {
    ($app:expr, $name:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(&json!({
                "username": $name,
                "display_name": $name,
                "email": format!("{}@example.com", $name),
                "password": "password123"
            }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "register {}", $name);
        let body: AuthResponse = test::read_body_json(resp).await;
        (body.user.id, body.token)
    }};
}

macro_rules! post_tweet {
    ($app:expr, $token:expr, $content:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/tweets")
            .insert_header(("Authorization", format!("Bearer {}", $token)))
            .set_json(&json!({ "content": $content }))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: TweetResponse = test::read_body_json(resp).await;
        body
    }};
}

fn authed(req: test::TestRequest, token: &str) -> test::TestRequest {
    req.insert_header(("Authorization", format!("Bearer {}", token)))
}

#[actix_web::test]
async fn test_register_and_login() {
    let app = test::init_service(create_test_app()).await;
    let (alice_id, _) = register!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(&json!({ "email": "alice@example.com", "password": "password123" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["id"], alice_id);
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("password").is_none());
}

#[actix_web::test]
async fn test_login_failures_are_indistinguishable() {
    let app = test::init_service(create_test_app()).await;
    register!(app, "alice");

    for (email, password) in [
        ("alice@example.com", "wrong-password"),
        ("nobody@example.com", "password123"),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(&json!({ "email": email, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "invalid_credentials");
    }
}

#[actix_web::test]
async fn test_duplicate_email_conflicts() {
    let app = test::init_service(create_test_app()).await;
    register!(app, "alice");

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "username": "alice2",
            "display_name": "Alice Again",
            "email": "alice@example.com",
            "password": "password123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "duplicate_email");
}

#[actix_web::test]
async fn test_register_rejects_invalid_input() {
    let app = test::init_service(create_test_app()).await;

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(&json!({
            "username": "al",
            "display_name": "Al",
            "email": "al@example.com",
            "password": "password123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "validation_error");
}

#[actix_web::test]
async fn test_requests_without_token_are_unauthorized() {
    let app = test::init_service(create_test_app()).await;

    let req = test::TestRequest::get().uri("/api/timeline").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = authed(test::TestRequest::get().uri("/api/timeline"), "garbage").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "unauthorized");
}

#[actix_web::test]
async fn test_follow_then_timeline_and_like() {
    let app = test::init_service(create_test_app()).await;
    let (alice_id, alice_token) = register!(app, "alice");
    let (bob_id, bob_token) = register!(app, "bob");

    let req = authed(
        test::TestRequest::post().uri(&format!("/api/users/{}/follow", bob_id)),
        &alice_token,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let t1 = post_tweet!(app, bob_token, "hi");
    assert_eq!(t1.author.id, bob_id);
    assert_eq!(t1.like_count, 0);

    let req = authed(test::TestRequest::get().uri("/api/timeline"), &alice_token).to_request();
    let timeline: Vec<TweetView> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].tweet.id, t1.id);
    assert!(!timeline[0].is_liked);

    let req = authed(
        test::TestRequest::post().uri(&format!("/api/tweets/{}/like", t1.id)),
        &alice_token,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = authed(
        test::TestRequest::get().uri(&format!("/api/tweets/{}", t1.id)),
        &alice_token,
    )
    .to_request();
    let view: TweetView = test::call_and_read_body_json(&app, req).await;
    assert!(view.is_liked);
    assert_eq!(view.tweet.like_count, 1);

    // Bob has not liked his own tweet.
    let req = authed(
        test::TestRequest::get().uri(&format!("/api/tweets/{}", t1.id)),
        &bob_token,
    )
    .to_request();
    let view: TweetView = test::call_and_read_body_json(&app, req).await;
    assert!(!view.is_liked);

    let req = authed(
        test::TestRequest::get().uri(&format!("/api/users/{}", bob_id)),
        &alice_token,
    )
    .to_request();
    let profile: UserProfile = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile.followers_count, 1);
    assert_eq!(profile.following_count, 0);
    assert!(profile.is_following);

    let req = authed(
        test::TestRequest::get().uri(&format!("/api/users/{}/followers", bob_id)),
        &alice_token,
    )
    .to_request();
    let followers: Vec<UserResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].id, alice_id);

    let req = authed(
        test::TestRequest::get().uri(&format!("/api/users/{}/likes", alice_id)),
        &alice_token,
    )
    .to_request();
    let liked: Vec<TweetResponse> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(liked.len(), 1);
    assert_eq!(liked[0].id, t1.id);
}

#[actix_web::test]
async fn test_follow_conflicts_and_unfollow() {
    let app = test::init_service(create_test_app()).await;
    let (alice_id, alice_token) = register!(app, "alice");
    let (bob_id, _) = register!(app, "bob");

    let req = authed(
        test::TestRequest::post().uri(&format!("/api/users/{}/follow", alice_id)),
        &alice_token,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "self_follow");

    let follow = || {
        authed(
            test::TestRequest::post().uri(&format!("/api/users/{}/follow", bob_id)),
            &alice_token,
        )
        .to_request()
    };
    assert_eq!(
        test::call_service(&app, follow()).await.status(),
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        test::call_service(&app, follow()).await.status(),
        StatusCode::CONFLICT
    );

    let unfollow = || {
        authed(
            test::TestRequest::delete().uri(&format!("/api/users/{}/follow", bob_id)),
            &alice_token,
        )
        .to_request()
    };
    assert_eq!(
        test::call_service(&app, unfollow()).await.status(),
        StatusCode::NO_CONTENT
    );
    let resp = test::call_service(&app, unfollow()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_following");

    let req = authed(
        test::TestRequest::post().uri("/api/users/9999/follow"),
        &alice_token,
    )
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_only_author_may_modify_tweet() {
    let app = test::init_service(create_test_app()).await;
    let (_, alice_token) = register!(app, "alice");
    let (_, bob_token) = register!(app, "bob");
    let tweet = post_tweet!(app, bob_token, "mine");

    let req = authed(
        test::TestRequest::delete().uri(&format!("/api/tweets/{}", tweet.id)),
        &alice_token,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "unauthorized");

    let req = authed(
        test::TestRequest::put().uri(&format!("/api/tweets/{}", tweet.id)),
        &alice_token,
    )
    .set_json(&json!({ "content": "hijacked" }))
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = authed(
        test::TestRequest::put().uri(&format!("/api/tweets/{}", tweet.id)),
        &bob_token,
    )
    .set_json(&json!({ "content": "edited", "image_url": "https://img/1.png" }))
    .to_request();
    let view: TweetView = test::call_and_read_body_json(&app, req).await;
    assert_eq!(view.tweet.content, "edited");
    assert_eq!(view.tweet.image_url.as_deref(), Some("https://img/1.png"));

    let req = authed(
        test::TestRequest::delete().uri(&format!("/api/tweets/{}", tweet.id)),
        &bob_token,
    )
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NO_CONTENT
    );

    let req = authed(
        test::TestRequest::get().uri(&format!("/api/tweets/{}", tweet.id)),
        &bob_token,
    )
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn test_tweet_length_limit() {
    let app = test::init_service(create_test_app()).await;
    let (_, token) = register!(app, "alice");

    let req = authed(test::TestRequest::post().uri("/api/tweets"), &token)
        .set_json(&json!({ "content": "x".repeat(281) }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let tweet = post_tweet!(app, token, "x".repeat(280));
    assert_eq!(tweet.content.chars().count(), 280);
}

#[actix_web::test]
async fn test_profile_updates() {
    let app = test::init_service(create_test_app()).await;
    let (alice_id, token) = register!(app, "alice");

    let req = authed(test::TestRequest::put().uri("/api/users/me"), &token)
        .set_json(&json!({ "display_name": "Alice L.", "bio": "hello" }))
        .to_request();
    let user: UserResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(user.id, alice_id);
    assert_eq!(user.display_name, "Alice L.");
    assert_eq!(user.bio.as_deref(), Some("hello"));

    let req = authed(test::TestRequest::put().uri("/api/users/me/image"), &token)
        .set_json(&json!({ "profile_image_url": "https://img/alice.png" }))
        .to_request();
    let user: UserResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(user.profile_image_url.as_deref(), Some("https://img/alice.png"));
    assert_eq!(user.display_name, "Alice L.");
}

#[actix_web::test]
async fn test_timeline_pagination() {
    let app = test::init_service(create_test_app()).await;
    let (_, token) = register!(app, "alice");
    for i in 0..5 {
        post_tweet!(app, token, format!("tweet {}", i));
    }

    let req = authed(
        test::TestRequest::get().uri("/api/timeline?limit=2&offset=1"),
        &token,
    )
    .to_request();
    let page: Vec<TweetView> = test::call_and_read_body_json(&app, req).await;
    let contents: Vec<&str> = page.iter().map(|v| v.tweet.content.as_str()).collect();
    assert_eq!(contents, vec!["tweet 3", "tweet 2"]);

    let req = authed(
        test::TestRequest::get().uri("/api/timeline?offset=10"),
        &token,
    )
    .to_request();
    let page: Vec<TweetView> = test::call_and_read_body_json(&app, req).await;
    assert!(page.is_empty());
}

// Service-level behaviour over the in-memory store.
// Run with: cargo test --test services_test

use social_graph_service::{
    config::Config,
    error::AppError,
    models::{LoginRequest, Page, RegisterRequest, UserResponse},
    services::Services,
    store::{EntityStore, MemoryStore},
};
use std::sync::Arc;

fn services() -> Services {
    let mut config = Config::from_env().expect("Failed to load configuration");
    config.password.bcrypt_cost = 4;
    let store: Arc<dyn EntityStore> = Arc::new(MemoryStore::new());
    Services::new(store, &config)
}

async fn register(services: &Services, name: &str) -> UserResponse {
    services
        .identity
        .register(RegisterRequest {
            username: name.to_string(),
            display_name: name.to_string(),
            email: format!("{}@example.com", name),
            password: "password123".to_string(),
            bio: None,
        })
        .await
        .expect("register")
}

#[tokio::test]
async fn timeline_is_own_plus_followed_newest_first() {
    let s = services();
    let alice = register(&s, "alice").await;
    let bob = register(&s, "bob").await;
    let carol = register(&s, "carol").await;

    s.graph.follow(alice.id, bob.id).await.unwrap();

    let a1 = s.timeline.create_tweet(alice.id, "a1".into(), None).await.unwrap();
    let b1 = s.timeline.create_tweet(bob.id, "b1".into(), None).await.unwrap();
    s.timeline.create_tweet(carol.id, "c1".into(), None).await.unwrap();
    let a2 = s.timeline.create_tweet(alice.id, "a2".into(), None).await.unwrap();

    let timeline = s.timeline.get_timeline(alice.id, Page::default()).await.unwrap();
    let ids: Vec<i64> = timeline.iter().map(|v| v.tweet.id).collect();
    assert_eq!(ids, vec![a2.id, b1.id, a1.id]);

    // Carol follows nobody, so she only sees herself.
    let timeline = s.timeline.get_timeline(carol.id, Page::default()).await.unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].tweet.author.username, "carol");
}

#[tokio::test]
async fn mutual_follow_does_not_duplicate_timeline_entries() {
    let s = services();
    let alice = register(&s, "alice").await;
    let bob = register(&s, "bob").await;
    s.graph.follow(alice.id, bob.id).await.unwrap();
    s.graph.follow(bob.id, alice.id).await.unwrap();
    s.timeline.create_tweet(bob.id, "hi".into(), None).await.unwrap();

    let timeline = s.timeline.get_timeline(alice.id, Page::default()).await.unwrap();
    assert_eq!(timeline.len(), 1);
}

#[tokio::test]
async fn unfollow_removes_tweets_from_timeline() {
    let s = services();
    let alice = register(&s, "alice").await;
    let bob = register(&s, "bob").await;
    s.graph.follow(alice.id, bob.id).await.unwrap();
    s.timeline.create_tweet(bob.id, "hi".into(), None).await.unwrap();

    s.graph.unfollow(alice.id, bob.id).await.unwrap();
    let timeline = s.timeline.get_timeline(alice.id, Page::default()).await.unwrap();
    assert!(timeline.is_empty());
    assert!(matches!(
        s.graph.unfollow(alice.id, bob.id).await,
        Err(AppError::NotFollowing)
    ));
}

#[tokio::test]
async fn follow_counts_are_mirrored() {
    let s = services();
    let alice = register(&s, "alice").await;
    let bob = register(&s, "bob").await;
    let carol = register(&s, "carol").await;
    s.graph.follow(alice.id, carol.id).await.unwrap();
    s.graph.follow(bob.id, carol.id).await.unwrap();

    assert_eq!(s.graph.followers_count(carol.id).await.unwrap(), 2);
    assert_eq!(s.graph.following_count(alice.id).await.unwrap(), 1);

    let followers = s.graph.list_followers(carol.id, Page::default()).await.unwrap();
    let names: Vec<&str> = followers.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["bob", "alice"]);

    let following = s.graph.list_following(alice.id, Page::default()).await.unwrap();
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].id, carol.id);
}

#[tokio::test]
async fn follow_rejects_self_duplicate_and_unknown() {
    let s = services();
    let alice = register(&s, "alice").await;
    let bob = register(&s, "bob").await;

    assert!(matches!(
        s.graph.follow(alice.id, alice.id).await,
        Err(AppError::SelfFollow)
    ));
    s.graph.follow(alice.id, bob.id).await.unwrap();
    assert!(matches!(
        s.graph.follow(alice.id, bob.id).await,
        Err(AppError::AlreadyFollowing)
    ));
    assert!(matches!(
        s.graph.follow(alice.id, 4242).await,
        Err(AppError::UserNotFound)
    ));
}

#[tokio::test]
async fn like_state_and_counts_track_each_other() {
    let s = services();
    let alice = register(&s, "alice").await;
    let bob = register(&s, "bob").await;
    let tweet = s.timeline.create_tweet(bob.id, "hi".into(), None).await.unwrap();

    assert!(!s.engagement.is_liked(alice.id, tweet.id).await.unwrap());
    s.engagement.like(alice.id, tweet.id).await.unwrap();
    assert!(s.engagement.is_liked(alice.id, tweet.id).await.unwrap());
    assert_eq!(s.engagement.like_count(tweet.id).await.unwrap(), 1);
    assert!(matches!(
        s.engagement.like(alice.id, tweet.id).await,
        Err(AppError::AlreadyLiked)
    ));

    s.engagement.unlike(alice.id, tweet.id).await.unwrap();
    assert_eq!(s.engagement.like_count(tweet.id).await.unwrap(), 0);
    assert!(matches!(
        s.engagement.unlike(alice.id, tweet.id).await,
        Err(AppError::NotLiked)
    ));
    assert!(matches!(
        s.engagement.like(alice.id, 9999).await,
        Err(AppError::TweetNotFound)
    ));
}

#[tokio::test]
async fn deleting_a_tweet_removes_its_likes() {
    let s = services();
    let alice = register(&s, "alice").await;
    let bob = register(&s, "bob").await;
    let tweet = s.timeline.create_tweet(bob.id, "hi".into(), None).await.unwrap();
    s.engagement.like(alice.id, tweet.id).await.unwrap();

    assert!(matches!(
        s.timeline.delete_tweet(tweet.id, alice.id).await,
        Err(AppError::NotOwner)
    ));
    s.timeline.delete_tweet(tweet.id, bob.id).await.unwrap();

    assert!(!s.engagement.is_liked(alice.id, tweet.id).await.unwrap());
    assert_eq!(s.engagement.like_count(tweet.id).await.unwrap(), 0);
    let liked = s
        .engagement
        .list_liked_tweets(alice.id, Page::default())
        .await
        .unwrap();
    assert!(liked.is_empty());
    assert!(matches!(
        s.timeline.delete_tweet(tweet.id, bob.id).await,
        Err(AppError::TweetNotFound)
    ));
}

#[tokio::test]
async fn anonymous_viewer_sees_nothing_liked() {
    let s = services();
    let alice = register(&s, "alice").await;
    let tweet = s.timeline.create_tweet(alice.id, "hi".into(), None).await.unwrap();
    s.engagement.like(alice.id, tweet.id).await.unwrap();

    let view = s.timeline.get_tweet(tweet.id, None).await.unwrap();
    assert!(!view.is_liked);
    assert_eq!(view.tweet.like_count, 1);

    let tweets = s
        .timeline
        .get_user_tweets(alice.id, Some(alice.id), Page::default())
        .await
        .unwrap();
    assert!(tweets[0].is_liked);
}

#[tokio::test]
async fn registration_normalizes_and_login_round_trips() {
    let s = services();
    let alice = s
        .identity
        .register(RegisterRequest {
            username: "  alice  ".to_string(),
            display_name: "Alice".to_string(),
            email: " alice@example.com ".to_string(),
            password: "password123".to_string(),
            bio: None,
        })
        .await
        .unwrap();
    assert_eq!(alice.username, "alice");
    assert_eq!(alice.email, "alice@example.com");

    let user = s
        .identity
        .login(LoginRequest {
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.id, alice.id);

    let token = s.identity.issue_token(user.id).unwrap();
    assert_eq!(s.identity.verify_token(&token).unwrap(), alice.id);
}

#[tokio::test]
async fn concurrent_likes_of_one_pair_succeed_once() {
    let s = services();
    let alice = register(&s, "alice").await;
    let tweet = s.timeline.create_tweet(alice.id, "hi".into(), None).await.unwrap();

    let attempts = (0..8).map(|_| s.engagement.like(alice.id, tweet.id));
    let results = futures::future::join_all(attempts).await;

    let ok = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(ok, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, AppError::AlreadyLiked)));
    assert_eq!(s.engagement.like_count(tweet.id).await.unwrap(), 1);
}

//! Fills the configured database with random users, tweets, follows and likes.
//!
//! Counts come from `SEED_USERS`, `SEED_TWEETS`, `SEED_FOLLOWS` and
//! `SEED_LIKES`. Every seeded account logs in with `password123`.

use anyhow::Context;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use social_graph_service::auth::hash_password;
use social_graph_service::config::Config;
use social_graph_service::db::create_pool;
use social_graph_service::error::AppError;
use social_graph_service::services::Services;
use social_graph_service::store::{EntityStore, NewUser, SeaOrmStore};
use std::env;
use std::sync::Arc;

const SEED_PASSWORD: &str = "password123";
const IMAGE_TWEET_RATIO: f64 = 0.3;

const WORDS: &[&str] = &[
    "rust", "coffee", "morning", "deploy", "weekend", "music", "river", "launch", "garden",
    "train", "window", "city", "storm", "bread", "signal", "quiet", "lantern", "market",
    "harbor", "ticket", "cloud", "paper", "summer", "orbit", "bridge", "pixel", "forest",
];

struct SeedCounts {
    users: usize,
    tweets: usize,
    follows: usize,
    likes: usize,
}

impl SeedCounts {
    fn from_env() -> Self {
        fn count(key: &str, default: usize) -> usize {
            env::var(key)
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(default)
        }

        SeedCounts {
            users: count("SEED_USERS", 1000),
            tweets: count("SEED_TWEETS", 10000),
            follows: count("SEED_FOLLOWS", 5000),
            likes: count("SEED_LIKES", 8000),
        }
    }
}

fn sentence(rng: &mut StdRng) -> String {
    let len = rng.gen_range(1..=20);
    let words: Vec<&str> = (0..len)
        .filter_map(|_| WORDS.choose(rng).copied())
        .collect();
    let mut sentence = words.join(" ");
    if let Some(first) = sentence.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    sentence.push('.');
    sentence
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env()?;
    let counts = SeedCounts::from_env();
    let pool = create_pool(&config)
        .await
        .context("failed to connect to the database")?;
    let store: Arc<dyn EntityStore> = Arc::new(SeaOrmStore::new(pool, config.store_timeout()));
    let services = Services::new(store.clone(), &config);
    let mut rng = StdRng::from_entropy();

    // One hash shared by every account; bcrypt per user would dominate the run.
    let cost = config.password.bcrypt_cost;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(SEED_PASSWORD, cost))
        .await??;

    let run = rng.gen::<u32>();
    let mut user_ids = Vec::with_capacity(counts.users);
    for i in 0..counts.users {
        let username = format!("user{}_{:x}", i, run);
        let new_user = NewUser {
            display_name: format!("User {}", i),
            email: format!("{}@example.com", username),
            username,
            password_hash: password_hash.clone(),
            bio: Some(sentence(&mut rng)),
        };
        match store.create_user(new_user).await {
            Ok(user) => user_ids.push(user.id),
            Err(e) => log::warn!("Skipping user {}: {}", i, e),
        }
    }
    log::info!("Seeded {} users", user_ids.len());
    anyhow::ensure!(!user_ids.is_empty(), "no users were created");

    let mut tweet_ids = Vec::with_capacity(counts.tweets);
    for _ in 0..counts.tweets {
        let Some(&author_id) = user_ids.choose(&mut rng) else {
            break;
        };
        let image_url = rng
            .gen_bool(IMAGE_TWEET_RATIO)
            .then(|| format!("https://picsum.photos/seed/{}/1200/675", rng.gen::<u32>()));
        match services
            .timeline
            .create_tweet(author_id, sentence(&mut rng), image_url)
            .await
        {
            Ok(tweet) => tweet_ids.push(tweet.id),
            Err(e) => log::warn!("Skipping tweet: {}", e),
        }
    }
    log::info!("Seeded {} tweets", tweet_ids.len());

    let mut follows = 0;
    for _ in 0..counts.follows {
        let (Some(&follower), Some(&following)) =
            (user_ids.choose(&mut rng), user_ids.choose(&mut rng))
        else {
            break;
        };
        match services.graph.follow(follower, following).await {
            Ok(()) => follows += 1,
            Err(AppError::SelfFollow | AppError::AlreadyFollowing) => {}
            Err(e) => return Err(e.into()),
        }
    }
    log::info!("Seeded {} follow edges", follows);

    let mut likes = 0;
    for _ in 0..counts.likes {
        let (Some(&user_id), Some(&tweet_id)) =
            (user_ids.choose(&mut rng), tweet_ids.choose(&mut rng))
        else {
            break;
        };
        match services.engagement.like(user_id, tweet_id).await {
            Ok(()) => likes += 1,
            Err(AppError::AlreadyLiked) => {}
            Err(e) => return Err(e.into()),
        }
    }
    log::info!("Seeded {} likes", likes);

    Ok(())
}

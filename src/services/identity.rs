use crate::auth::{create_token, hash_password, verify_password, verify_token, Claims};
use crate::config::{JwtConfig, PasswordConfig};
use crate::error::{AppError, AppResult};
use crate::models::{
    LoginRequest, RegisterRequest, UpdateProfileImageRequest, UpdateProfileRequest, UserProfile,
    UserResponse,
};
use crate::store::{EntityStore, NewUser, ProfileChanges};
use std::sync::Arc;
use validator::Validate;

/// Accounts, credentials and session tokens.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn EntityStore>,
    jwt: JwtConfig,
    bcrypt_cost: u32,
}

impl IdentityService {
    pub fn new(store: Arc<dyn EntityStore>, jwt: JwtConfig, password: PasswordConfig) -> Self {
        IdentityService {
            store,
            jwt,
            bcrypt_cost: password.bcrypt_cost,
        }
    }

    /// Creates an account. The username/email pre-checks only give a friendlier
    /// error; a racing insert is still rejected by the store constraint and
    /// surfaces as the same duplicate kind.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<UserResponse> {
        let request = RegisterRequest {
            username: request.username.trim().to_string(),
            email: request.email.trim().to_string(),
            ..request
        };
        request.validate()?;

        if self
            .store
            .find_user_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateUsername);
        }
        if self.store.find_user_by_email(&request.email).await?.is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let cost = self.bcrypt_cost;
        let password = request.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("password hashing task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("password hashing error: {}", e)))?;

        let user = self
            .store
            .create_user(NewUser {
                username: request.username,
                display_name: request.display_name,
                email: request.email,
                password_hash,
                bio: request.bio,
            })
            .await?;

        log::info!("Registered user {} ({})", user.id, user.username);
        Ok(user.into())
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, request: LoginRequest) -> AppResult<UserResponse> {
        let request = LoginRequest {
            email: request.email.trim().to_string(),
            ..request
        };
        request.validate()?;
        let Some(user) = self.store.find_user_by_email(&request.email).await? else {
            log::debug!("Login rejected: unknown email");
            return Err(AppError::InvalidCredentials);
        };

        let password = request.password;
        let hash = user.password_hash.clone();
        let is_valid = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("password check task failed: {}", e)))?;

        if !is_valid {
            log::debug!("Login rejected for user {}: bad password", user.id);
            return Err(AppError::InvalidCredentials);
        }

        Ok(user.into())
    }

    pub fn issue_token(&self, user_id: i64) -> AppResult<String> {
        let claims = Claims::new(user_id, self.jwt.expiration_hours);
        create_token(&claims, &self.jwt.secret)
            .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
    }

    pub fn verify_token(&self, token: &str) -> AppResult<i64> {
        let claims = verify_token(token, &self.jwt.secret).map_err(|e| {
            log::debug!("Token rejected: {}", e);
            AppError::unauthorized("Invalid token")
        })?;
        claims
            .user_id()
            .ok_or_else(|| AppError::unauthorized("Invalid token subject"))
    }

    /// Profile with follower counts and whether `viewer_id` follows the user.
    ///
    /// The queries are independent and may observe slightly different
    /// snapshots under concurrent writes.
    pub async fn get_profile(
        &self,
        user_id: i64,
        viewer_id: Option<i64>,
    ) -> AppResult<UserProfile> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let is_following = async {
            match viewer_id {
                Some(viewer_id) if viewer_id != 0 => {
                    self.store.follow_exists(viewer_id, user_id).await
                }
                _ => Ok(false),
            }
        };
        let (followers_count, following_count, is_following) = tokio::try_join!(
            self.store.count_followers(user_id),
            self.store.count_following(user_id),
            is_following,
        )?;

        Ok(UserProfile {
            user: user.into(),
            followers_count,
            following_count,
            is_following,
        })
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> AppResult<UserResponse> {
        request.validate()?;
        let changes = ProfileChanges {
            display_name: Some(request.display_name),
            bio: Some(request.bio),
            ..Default::default()
        };
        let user = self
            .store
            .update_user(user_id, changes)
            .await?
            .ok_or(AppError::UserNotFound)?;
        Ok(user.into())
    }

    /// Only the URL reference is kept; media storage lives elsewhere.
    pub async fn update_profile_image(
        &self,
        user_id: i64,
        request: UpdateProfileImageRequest,
    ) -> AppResult<UserResponse> {
        request.validate()?;
        let changes = ProfileChanges {
            profile_image_url: Some(request.profile_image_url),
            ..Default::default()
        };
        let user = self
            .store
            .update_user(user_id, changes)
            .await?
            .ok_or(AppError::UserNotFound)?;
        Ok(user.into())
    }
}

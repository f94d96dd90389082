use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;
pub type StoreResult<T> = Result<T, StoreError>;

/// Constraint that rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    Username,
    Email,
    FollowEdge,
    LikeEdge,
}

/// Row a write pointed at through a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    User,
    Tweet,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0:?}")]
    Duplicate(UniqueKey),

    #[error("referenced {0:?} does not exist")]
    MissingReference(Reference),

    #[error("store call exceeded {0:?}")]
    Timeout(Duration),

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("store error: {0}")]
    Internal(String),
}

/// Every failure a service operation can surface to its caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("user not found")]
    UserNotFound,

    #[error("tweet not found")]
    TweetNotFound,

    #[error("not following this user")]
    NotFollowing,

    #[error("tweet is not liked")]
    NotLiked,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("already following this user")]
    AlreadyFollowing,

    #[error("tweet already liked")]
    AlreadyLiked,

    #[error("cannot follow yourself")]
    SelfFollow,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Unauthorized(String),

    #[error("only the author may modify this tweet")]
    NotOwner,

    #[error(transparent)]
    Store(StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable kind, rendered as the `error` field of a response body.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::UserNotFound => "user_not_found",
            AppError::TweetNotFound => "tweet_not_found",
            AppError::NotFollowing => "not_following",
            AppError::NotLiked => "not_liked",
            AppError::DuplicateUsername => "duplicate_username",
            AppError::DuplicateEmail => "duplicate_email",
            AppError::AlreadyFollowing => "already_following",
            AppError::AlreadyLiked => "already_liked",
            AppError::SelfFollow => "self_follow",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::Unauthorized(_) | AppError::NotOwner => "unauthorized",
            AppError::Store(StoreError::Timeout(_)) => "timeout",
            AppError::Store(_) | AppError::Internal(_) => "internal_error",
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }
}

/// Constraint rejections become the same conflict and not-found kinds the
/// services pre-check for; everything else stays an opaque store failure.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(UniqueKey::Username) => AppError::DuplicateUsername,
            StoreError::Duplicate(UniqueKey::Email) => AppError::DuplicateEmail,
            StoreError::Duplicate(UniqueKey::FollowEdge) => AppError::AlreadyFollowing,
            StoreError::Duplicate(UniqueKey::LikeEdge) => AppError::AlreadyLiked,
            StoreError::MissingReference(Reference::User) => AppError::UserNotFound,
            StoreError::MissingReference(Reference::Tweet) => AppError::TweetNotFound,
            other => AppError::Store(other),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::UserNotFound
            | AppError::TweetNotFound
            | AppError::NotFollowing
            | AppError::NotLiked => StatusCode::NOT_FOUND,
            AppError::DuplicateUsername
            | AppError::DuplicateEmail
            | AppError::AlreadyFollowing
            | AppError::AlreadyLiked
            | AppError::SelfFollow => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotOwner => StatusCode::FORBIDDEN,
            AppError::Store(StoreError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("Request failed: {}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(json!({
            "error": self.kind(),
            "message": message,
        }))
    }
}

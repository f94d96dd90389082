use crate::error::AppError;
use crate::services::IdentityService;
use actix_web::{web, FromRequest, HttpRequest};
use std::future::{ready, Ready};

/// Viewer identity taken from a verified `Authorization: Bearer` token.
pub struct AuthenticatedUser {
    pub user_id: i64,
}

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "));

        let Some(token) = token else {
            return ready(Err(AppError::unauthorized(
                "Missing or invalid authorization header",
            )));
        };

        let Some(identity) = req.app_data::<web::Data<IdentityService>>() else {
            return ready(Err(AppError::Internal(
                "identity service not configured".to_string(),
            )));
        };

        ready(
            identity
                .verify_token(token)
                .map(|user_id| AuthenticatedUser { user_id }),
        )
    }
}

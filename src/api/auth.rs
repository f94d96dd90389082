use crate::error::AppError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest};
use crate::services::IdentityService;
use actix_web::{web, HttpResponse};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Bad request"),
        (status = 409, description = "Username or email already exists")
    ),
    tag = "auth"
)]
pub async fn register(
    req: web::Json<RegisterRequest>,
    identity: web::Data<IdentityService>,
) -> Result<HttpResponse, AppError> {
    let user = identity.register(req.into_inner()).await?;
    let token = identity.issue_token(user.id)?;

    Ok(HttpResponse::Created().json(AuthResponse { token, user }))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    req: web::Json<LoginRequest>,
    identity: web::Data<IdentityService>,
) -> Result<HttpResponse, AppError> {
    let user = identity.login(req.into_inner()).await?;
    let token = identity.issue_token(user.id)?;

    Ok(HttpResponse::Ok().json(AuthResponse { token, user }))
}

//! Authentication endpoints: captcha, register, login, logout, me.

use actix_web::{HttpResponse, get, post, web};
use sea_orm::DatabaseConnection;
use tracing::{info, warn};

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthUser, ROLE_USER, RoleLookup, issue_session_token};
use crate::config::Config;
use crate::db;
use crate::error::{AppError, AppResult};
use crate::models::{
    CaptchaResponse, LoginRequest, LoginResponse, RegisterRequest, UserInfo, VisitCountEvent,
};
use crate::services::{CaptchaService, EventBroadcaster};

const MIN_PASSWORD_LEN: usize = 6;

/// Configure auth routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(captcha)
        .service(register)
        .service(login)
        .service(logout)
        .service(me);
}

async fn user_info(
    db: &DatabaseConnection,
    roles: &RoleLookup,
    user: crate::entity::user::Model,
) -> AppResult<UserInfo> {
    let role_codes = roles.roles_of(user.id).await?;
    Ok(UserInfo {
        id: user.id,
        nickname: user.nickname.unwrap_or_else(|| user.username.clone()),
        username: user.username,
        email: user.email,
        avatar_url: user.avatar_url,
        roles: role_codes,
    })
}

/// Issue a captcha challenge.
#[utoipa::path(
    get,
    path = "/api/v1/auth/captcha",
    tag = "Auth",
    responses(
        (status = 200, description = "Challenge issued", body = CaptchaResponse)
    )
)]
#[get("/auth/captcha")]
pub async fn captcha(captchas: web::Data<CaptchaService>) -> HttpResponse {
    HttpResponse::Ok().json(captchas.issue().await)
}

/// Register a new account. A fresh account always holds the plain `user`
/// role.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserInfo),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 409, description = "Username taken", body = crate::error::ErrorResponse),
    )
)]
#[post("/auth/register")]
pub async fn register(
    db: web::Data<DatabaseConnection>,
    roles: web::Data<RoleLookup>,
    captchas: web::Data<CaptchaService>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    captchas.verify(&req.captcha_key, &req.captcha).await?;

    let username = req.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("Username is required".to_string()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if req.password != req.confirm_password {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }

    if db::users::find_by_username(db.get_ref(), username)
        .await?
        .is_some()
    {
        return Err(AppError::Duplicate(format!(
            "Username '{}' is already taken",
            username
        )));
    }
    if let Some(ref email) = req.email {
        if db::users::find_by_email(db.get_ref(), email).await?.is_some() {
            return Err(AppError::Duplicate(format!(
                "Email '{}' is already registered",
                email
            )));
        }
    }

    let password_hash = hash_password(&req.password)?;
    let user = db::users::insert(
        db.get_ref(),
        username,
        &password_hash,
        req.nickname.as_deref(),
        req.email.as_deref(),
        req.phone.as_deref(),
    )
    .await?;

    if let Some(role) = db::roles::find_by_code(db.get_ref(), ROLE_USER).await? {
        db::roles::assign(db.get_ref(), user.id, role.id).await?;
    } else {
        warn!("Default role '{}' is missing, user {} has no role", ROLE_USER, user.id);
    }

    info!("User registered: id={}, username={}", user.id, user.username);

    let info = user_info(db.get_ref(), roles.get_ref(), user).await?;
    Ok(HttpResponse::Created().json(info))
}

/// Log in with username, password and captcha. A successful login counts
/// as one site visit and fans the new total out to SSE subscribers.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 401, description = "Bad credentials", body = crate::error::ErrorResponse),
    )
)]
#[post("/auth/login")]
pub async fn login(
    db: web::Data<DatabaseConnection>,
    config: web::Data<Config>,
    roles: web::Data<RoleLookup>,
    captchas: web::Data<CaptchaService>,
    broadcaster: web::Data<EventBroadcaster>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    captchas.verify(&req.captcha_key, &req.captcha).await?;

    let user = db::users::find_by_username(db.get_ref(), req.username.trim())
        .await?
        .ok_or_else(|| AppError::Unauthorized("Bad username or password".to_string()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(
            "Bad username or password".to_string(),
        ));
    }
    if !user.enabled {
        return Err(AppError::PermissionDenied(
            "Account is disabled".to_string(),
        ));
    }

    let token = issue_session_token(config.get_ref(), &user)?;

    // Visit accounting is best-effort; a failed insert must not block the
    // login itself.
    match db::visits::record(db.get_ref(), user.id).await {
        Ok(()) => match db::visits::count(db.get_ref()).await {
            Ok(total) => {
                broadcaster.send(VisitCountEvent::new(total));
            }
            Err(e) => warn!("Visit count query failed: {}", e),
        },
        Err(e) => warn!("Visit log insert failed: {}", e),
    }

    info!("User logged in: id={}, username={}", user.id, user.username);

    let user = user_info(db.get_ref(), roles.get_ref(), user).await?;
    Ok(HttpResponse::Ok().json(LoginResponse { token, user }))
}

/// Log out. Sessions are stateless JWTs, so this only confirms the client
/// should drop its token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
    )
)]
#[post("/auth/logout")]
pub async fn logout(auth: AuthUser) -> HttpResponse {
    info!("User logged out: id={}", auth.user_id);
    HttpResponse::Ok().json(serde_json::json!({ "message": "Logged out" }))
}

/// Current user info.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
    )
)]
#[get("/auth/me")]
pub async fn me(
    auth: AuthUser,
    db: web::Data<DatabaseConnection>,
    roles: web::Data<RoleLookup>,
) -> AppResult<HttpResponse> {
    let user = db::users::find_by_id(db.get_ref(), auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    let info = user_info(db.get_ref(), roles.get_ref(), user).await?;
    Ok(HttpResponse::Ok().json(info))
}

//! Authentication request/response models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Captcha challenge issued to a client before login/register.
///
/// Image rendering is left to the frontend; the server hands out the
/// challenge text together with its one-time key.
#[derive(Debug, Serialize, ToSchema)]
pub struct CaptchaResponse {
    pub key: String,
    pub challenge: String,
}

/// Login request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub captcha_key: String,
    pub captcha: String,
}

/// Registration request body.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub captcha_key: String,
    pub captcha: String,
}

/// Public user info returned after login and from /auth/me.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub nickname: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub roles: Vec<String>,
}

/// Login response: bearer token plus user info.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Session JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
    pub user_id: i64,
    pub username: String,
}

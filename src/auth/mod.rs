//! Session token handling and role checks.

pub mod extractor;
pub mod password;
pub mod roles;

pub use extractor::AuthUser;
pub use roles::{ROLE_ADMIN, ROLE_SUPER_ADMIN, ROLE_USER, RoleLookup};

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;

use crate::config::Config;
use crate::entity::user;
use crate::error::{AppError, AppResult};
use crate::models::SessionClaims;

/// Session JWT issuer.
pub const SESSION_ISSUER: &str = "mcs";

/// Issue a session JWT for a user.
pub fn issue_session_token(config: &Config, user: &user::Model) -> AppResult<String> {
    let now = Utc::now();
    let expiry = now + chrono::Duration::hours(config.token_ttl_hours);

    let claims = SessionClaims {
        sub: user.id.to_string(),
        iss: SESSION_ISSUER.to_string(),
        exp: expiry.timestamp() as usize,
        iat: now.timestamp() as usize,
        user_id: user.id,
        username: user.username.clone(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Unauthorized(format!("Failed to issue session token: {}", e)))
}

/// Decode and validate a session JWT.
pub fn decode_session_token(config: &Config, token: &str) -> AppResult<SessionClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);

    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| AppError::Unauthorized(format!("Invalid session token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Environment, GiteaSettings};
    use secrecy::SecretString;

    fn test_config() -> Config {
        Config {
            environment: Environment::Development,
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: "postgres://test".to_string(),
            jwt_secret: SecretString::from("test-secret"),
            token_ttl_hours: 1,
            captcha_ttl_secs: 300,
            max_upload_size: 1024,
            gitea: GiteaSettings {
                base_url: "http://localhost:3000".to_string(),
                account: "modelcloud".to_string(),
                token: SecretString::from("t"),
            },
        }
    }

    fn test_user() -> user::Model {
        let now = Utc::now();
        user::Model {
            id: 42,
            username: "alice".to_string(),
            password_hash: "x".to_string(),
            nickname: None,
            email: None,
            phone: None,
            avatar_url: None,
            enabled: true,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn token_round_trip() {
        let config = test_config();
        let token = issue_session_token(&config, &test_user()).unwrap();
        let claims = decode_session_token(&config, &token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.iss, SESSION_ISSUER);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let config = test_config();
        let token = issue_session_token(&config, &test_user()).unwrap();

        let mut other = test_config();
        other.jwt_secret = SecretString::from("different-secret");
        assert!(decode_session_token(&other, &token).is_err());
    }
}

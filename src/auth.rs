//! Password hashing and session tokens.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie};
use argon2::{self, Config as ArgonConfig};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;

use crate::config::AuthSettings;
use crate::error::AppError;
use crate::models::{Claims, Role};

pub const SESSION_COOKIE: &str = "jwt";

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let config = ArgonConfig::default();

    argon2::hash_encoded(password.as_bytes(), &salt, &config)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    argon2::verify_encoded(hash, password.as_bytes()).unwrap_or(false)
}

pub fn issue_token(settings: &AuthSettings, user_id: &str, role: Role) -> Result<String, AppError> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(settings.token_ttl_hours))
        .ok_or_else(|| AppError::Internal("Token expiry overflow".to_string()))?
        .timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to encode token: {e}")))
}

/// Checks signature and expiry. Any failure is reported as unauthorized.
pub fn verify_token(settings: &AuthSettings, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::unauthorized())
}

pub fn session_cookie(settings: &AuthSettings, token: &str) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .secure(settings.cookie_secure)
        .max_age(CookieDuration::hours(settings.token_ttl_hours))
        .finish()
}

pub fn expired_session_cookie(settings: &AuthSettings) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(settings.cookie_secure)
        .finish();
    cookie.make_removal();
    cookie
}

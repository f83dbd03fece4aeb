use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{expired_session_cookie, hash_password, issue_token, session_cookie, verify_password};
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Role, SignInInput, SignUpInput, User, UserProfile};
use crate::AppState;

const MIN_PASSWORD_LENGTH: usize = 8;

fn signed_in(state: &AppState, user: UserProfile) -> Result<HttpResponse> {
    let token = issue_token(&state.auth, &user.id, user.role)?;
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&state.auth, &token))
        .json(json!({
            "success": true,
            "token": token,
            "user": user,
        })))
}

pub async fn sign_up(state: web::Data<AppState>, input: web::Json<SignUpInput>) -> Result<HttpResponse> {
    let input = input.into_inner();
    let name = input.name.trim();
    let email = input.email.trim().to_lowercase();

    if name.is_empty() || email.is_empty() || input.password.is_empty() {
        return Err(AppError::Validation("Please fill all fields".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("Please provide a valid email".to_string()));
    }
    if input.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Validation("User already exists".to_string()));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email,
        password: hash_password(&input.password)?,
        role: Role::Customer,
        cart: Vec::new(),
        orders: Vec::new(),
        created_at: Utc::now(),
    };
    state.users.insert(&user).await?;
    log::info!("Created account {}", user.id);

    signed_in(&state, UserProfile::from(&user))
}

pub async fn login(state: web::Data<AppState>, input: web::Json<SignInInput>) -> Result<HttpResponse> {
    let email = input.email.trim().to_lowercase();
    if email.is_empty() || input.password.is_empty() {
        return Err(AppError::Validation("Please fill all fields".to_string()));
    }

    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());
    let user = state.users.find_by_email(&email).await?.ok_or_else(invalid)?;
    if !verify_password(&user.password, &input.password) {
        return Err(invalid());
    }

    signed_in(&state, UserProfile::from(&user))
}

pub async fn logout(state: web::Data<AppState>, _user: CurrentUser) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(expired_session_cookie(&state.auth))
        .json(json!({ "success": true, "message": "Logged out" }))
}

pub async fn profile(user: CurrentUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "user": user.0 }))
}

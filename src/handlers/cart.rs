use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{CartCountInput, UserProfile};
use crate::AppState;

/// Re-reads the user so cart changes apply to the stored document rather
/// than the copy resolved by the auth middleware.
async fn load_user(state: &AppState, user: &CurrentUser) -> Result<UserProfile> {
    state
        .users
        .find_profile(&user.0.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No user was found".to_string()))
}

pub async fn add_to_cart(
    state: web::Data<AppState>,
    current: CurrentUser,
    product_id: web::Path<String>,
) -> Result<HttpResponse> {
    let mut user = load_user(&state, &current).await?;

    if !user.add_to_cart(&product_id) {
        return Ok(HttpResponse::NoContent().finish());
    }
    state.users.save_cart(&user).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "user": user })))
}

pub async fn update_cart_count(
    state: web::Data<AppState>,
    current: CurrentUser,
    product_id: web::Path<String>,
    input: web::Json<CartCountInput>,
) -> Result<HttpResponse> {
    if input.count < 1 {
        return Err(AppError::Validation("Count must be at least 1".to_string()));
    }

    let mut user = load_user(&state, &current).await?;
    user.set_cart_count(&product_id, input.count);
    state.users.save_cart(&user).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "user": user })))
}

pub async fn remove_from_cart(
    state: web::Data<AppState>,
    current: CurrentUser,
    product_id: web::Path<String>,
) -> Result<HttpResponse> {
    let mut user = load_user(&state, &current).await?;
    user.remove_from_cart(&product_id);
    state.users.save_cart(&user).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "user": user,
        "productId": product_id.into_inner(),
    })))
}

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Coupon, CouponInput};
use crate::AppState;

pub async fn create_coupon(
    state: web::Data<AppState>,
    user: CurrentUser,
    input: web::Json<CouponInput>,
) -> Result<HttpResponse> {
    user.require_admin()?;

    let code = input.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::Validation("Coupon code is required".to_string()));
    }
    if !(1..=99).contains(&input.discount) {
        return Err(AppError::Validation("Discount must be between 1 and 99".to_string()));
    }
    if state.coupons.find_by_code(&code).await?.is_some() {
        return Err(AppError::Validation("Coupon code already exists".to_string()));
    }

    let coupon = Coupon {
        id: Uuid::new_v4().to_string(),
        code,
        discount: input.discount,
        active: true,
        created_at: Utc::now(),
    };
    state.coupons.insert(&coupon).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "coupon": coupon })))
}

pub async fn get_all_coupons(state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse> {
    user.require_admin()?;
    let coupons = state.coupons.list().await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "coupons": coupons })))
}

pub async fn delete_coupon(
    state: web::Data<AppState>,
    user: CurrentUser,
    id: web::Path<String>,
) -> Result<HttpResponse> {
    user.require_admin()?;
    if !state.coupons.delete(&id).await? {
        return Err(AppError::NotFound("Coupon not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Coupon deleted successfully",
    })))
}

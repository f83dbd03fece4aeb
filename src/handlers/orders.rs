use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{CheckoutInput, PaymentConfirmation};
use crate::payment::{bill_amount, OrderRequest};
use crate::AppState;

/// Prices the requested products from the catalog and opens a gateway order.
pub async fn generate_razorpay_order(
    state: web::Data<AppState>,
    _user: CurrentUser,
    input: web::Json<CheckoutInput>,
) -> Result<HttpResponse> {
    let products = state.products.find_many(&input.product_ids).await?;
    let amount = bill_amount(&products)?;

    let request = OrderRequest::new(amount, &state.currency, Utc::now());
    let order = state.payments.create_order(&request).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Moves the cart into the orders list once the gateway confirms payment.
/// Replays with a non-empty cart append again; nothing ties an order to the
/// payment id.
pub async fn payment_success(
    state: web::Data<AppState>,
    current: CurrentUser,
    confirmation: web::Json<PaymentConfirmation>,
) -> Result<HttpResponse> {
    let (Some(order_id), Some(payment_id), Some(signature)) = (
        present(&confirmation.razorpay_order_id),
        present(&confirmation.razorpay_payment_id),
        present(&confirmation.razorpay_signature),
    ) else {
        return Err(AppError::Validation("Payment details are missing".to_string()));
    };

    if !state.payments.verify_payment(order_id, payment_id, signature) {
        log::warn!("Rejected payment {payment_id} for order {order_id}: bad signature");
        return Err(AppError::Validation("Payment verification failed".to_string()));
    }

    let mut user = state
        .users
        .find_profile(&current.0.id)
        .await?
        .ok_or_else(|| AppError::NotFound("No user was found".to_string()))?;

    let moved = user.move_cart_to_orders();
    state.users.save_cart(&user).await?;
    log::info!("Payment {payment_id} placed {moved} item(s) for user {}", user.id);

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Order placed successfully",
        "user": user,
    })))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use actix_web::http::StatusCode;
    use actix_web::test;

    use crate::models::{Product, Role, UserProfile};
    use crate::payment::{GatewayError, GatewayOrder};
    use crate::test_helpers::{bearer, product, profile, profile_with_cart, test_app, Mocks};

    use super::*;

    fn catalog(ids: &[String]) -> Vec<Product> {
        [product("p1", "Mango", 49.99), product("p2", "Banana", 0.5), product("free", "Sticker", 0.0)]
            .into_iter()
            .filter(|p| ids.contains(&p.id))
            .collect()
    }

    fn checkout(ids: &[&str]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/order/razorpay")
            .insert_header(bearer("u1"))
            .set_json(json!({ "productIds": ids }))
    }

    #[actix_web::test]
    async fn checkout_bills_current_prices_in_minor_units() {
        let mut mocks = Mocks::signed_in_as(profile("u1", Role::Customer));
        mocks.products.expect_find_many().returning(|ids| Ok(catalog(ids)));
        mocks
            .payments
            .expect_create_order()
            .withf(|request: &OrderRequest| {
                request.amount == 5049 && request.currency == "INR" && request.receipt.starts_with("receipt_")
            })
            .times(1)
            .returning(|request| {
                Ok(GatewayOrder {
                    id: "order_1".to_string(),
                    amount: request.amount,
                    currency: request.currency.clone(),
                    receipt: Some(request.receipt.clone()),
                    status: Some("created".to_string()),
                })
            });
        let app = test_app!(mocks);

        let resp = test::call_service(&app, checkout(&["p1", "p2", "unknown"]).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["order"]["id"], "order_1");
        assert_eq!(body["order"]["amount"], 5049);
    }

    #[actix_web::test]
    async fn zero_total_never_reaches_the_gateway() {
        let mut mocks = Mocks::signed_in_as(profile("u1", Role::Customer));
        mocks.products.expect_find_many().returning(|ids| Ok(catalog(ids)));
        mocks.payments.expect_create_order().times(0);
        let app = test_app!(mocks);

        for ids in [vec![], vec!["free"], vec!["unknown"]] {
            let resp = test::call_service(&app, checkout(&ids).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "ids {ids:?}");

            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], "Amount to bill is 0");
        }
    }

    #[actix_web::test]
    async fn gateway_failure_is_a_server_error() {
        let mut mocks = Mocks::signed_in_as(profile("u1", Role::Customer));
        mocks.products.expect_find_many().returning(|ids| Ok(catalog(ids)));
        mocks
            .payments
            .expect_create_order()
            .returning(|_| Err(GatewayError::Rejected("401 Unauthorized".to_string())));
        let app = test_app!(mocks);

        let resp = test::call_service(&app, checkout(&["p1"]).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    fn confirm(body: serde_json::Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/order/razorpay/success")
            .insert_header(bearer("u1"))
            .set_json(body)
    }

    fn valid_confirmation() -> serde_json::Value {
        json!({
            "razorpay_order_id": "order_1",
            "razorpay_payment_id": "pay_1",
            "razorpay_signature": "sig",
        })
    }

    fn mocks_with_cart(cart: &[&str], signature_ok: bool) -> (Mocks, Arc<Mutex<UserProfile>>) {
        let document = Arc::new(Mutex::new(profile_with_cart("u1", cart)));
        let mut mocks = Mocks::default();

        let read = Arc::clone(&document);
        mocks
            .users
            .expect_find_profile()
            .returning(move |_| Ok(Some(read.lock().unwrap().clone())));
        let write = Arc::clone(&document);
        mocks.users.expect_save_cart().returning(move |user| {
            *write.lock().unwrap() = user.clone();
            Ok(())
        });
        mocks
            .payments
            .expect_verify_payment()
            .returning(move |_, _, _| signature_ok);

        (mocks, document)
    }

    #[actix_web::test]
    async fn confirmed_payment_moves_cart_into_orders() {
        let (mocks, document) = mocks_with_cart(&["p2", "p1"], true);
        let app = test_app!(mocks);

        let resp = test::call_service(&app, confirm(valid_confirmation()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let user = document.lock().unwrap().clone();
        assert!(user.cart.is_empty());
        let ordered: Vec<_> = user.orders.iter().map(|item| item.product_id.as_str()).collect();
        assert_eq!(ordered, ["p2", "p1"]);
    }

    #[actix_web::test]
    async fn replay_with_empty_cart_changes_nothing() {
        let (mocks, document) = mocks_with_cart(&["p1"], true);
        let app = test_app!(mocks);

        test::call_service(&app, confirm(valid_confirmation()).to_request()).await;
        let resp = test::call_service(&app, confirm(valid_confirmation()).to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(document.lock().unwrap().orders.len(), 1);
    }

    #[actix_web::test]
    async fn missing_identifiers_are_rejected() {
        let (mocks, document) = mocks_with_cart(&["p1"], true);
        let app = test_app!(mocks);

        for field in ["razorpay_order_id", "razorpay_payment_id", "razorpay_signature"] {
            let mut body = valid_confirmation();
            body[field] = json!("");
            let resp = test::call_service(&app, confirm(body).to_request()).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "field {field}");
        }

        let resp = test::call_service(&app, confirm(json!({})).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(document.lock().unwrap().cart.len(), 1);
    }

    #[actix_web::test]
    async fn bad_signature_keeps_the_cart() {
        let (mocks, document) = mocks_with_cart(&["p1"], false);
        let app = test_app!(mocks);

        let resp = test::call_service(&app, confirm(valid_confirmation()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Payment verification failed");
        assert_eq!(document.lock().unwrap().cart.len(), 1);
    }
}

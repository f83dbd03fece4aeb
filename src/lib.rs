//! REST backend for a small shop: catalog, cart, collections, coupons,
//! Razorpay checkout and JWT sessions over MongoDB.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::web;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod payment;
pub mod storage;

#[cfg(test)]
mod test_helpers;

use config::AuthSettings;
use db::{CollectionStore, CouponStore, ProductStore, UserStore};
use middleware::AuthMiddleware;
use payment::PaymentGateway;
use storage::ObjectStorage;

/// Collaborators shared by every handler, registered once as `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub collections: Arc<dyn CollectionStore>,
    pub coupons: Arc<dyn CouponStore>,
    pub payments: Arc<dyn PaymentGateway>,
    pub storage: Arc<dyn ObjectStorage>,
    pub auth: AuthSettings,
    pub currency: String,
}

/// Mirrors the caller's origin and allows credentials. Preflights are
/// answered here and never reach [`AuthMiddleware`].
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

/// Route table. Everything except signup and login sits behind [`AuthMiddleware`].
pub fn configure(cfg: &mut web::ServiceConfig) {
    use handlers::{auth, cart, collections, coupons, orders, products};

    cfg.app_data(error::json_config())
        .app_data(error::path_config())
        .service(
            web::scope("/api/auth")
                .service(
                    web::resource("/signup")
                        .route(web::post().to(auth::sign_up))
                        .default_service(web::to(error::not_found)),
                )
                .service(
                    web::resource("/login")
                        .route(web::post().to(auth::login))
                        .default_service(web::to(error::not_found)),
                )
                .service(
                    web::resource("/logout")
                        .route(web::get().to(auth::logout))
                        .default_service(web::to(error::not_found))
                        .wrap(AuthMiddleware),
                )
                .service(
                    web::resource("/profile")
                        .route(web::get().to(auth::profile))
                        .default_service(web::to(error::not_found))
                        .wrap(AuthMiddleware),
                ),
        )
        .service(
            web::scope("/api")
                .wrap(AuthMiddleware)
                .route("/products", web::get().to(products::get_all_products))
                .route("/products", web::post().to(products::add_product))
                .route("/products/id/{id}", web::get().to(products::get_product_by_id))
                .route("/products/{search_text}", web::get().to(products::search_products))
                .route("/cart/{id}", web::post().to(cart::add_to_cart))
                .route("/cart/{id}", web::put().to(cart::update_cart_count))
                .route("/cart/{id}", web::delete().to(cart::remove_from_cart))
                .route("/collection", web::post().to(collections::create_collection))
                .route("/collection", web::get().to(collections::get_all_collections))
                .route("/collection/{id}", web::put().to(collections::update_collection))
                .route("/collection/{id}", web::delete().to(collections::delete_collection))
                .route("/coupon", web::post().to(coupons::create_coupon))
                .route("/coupon", web::get().to(coupons::get_all_coupons))
                .route("/coupon/{id}", web::delete().to(coupons::delete_coupon))
                .route("/order/razorpay", web::post().to(orders::generate_razorpay_order))
                .route("/order/razorpay/success", web::post().to(orders::payment_success)),
        )
        .default_service(web::to(error::not_found));
}

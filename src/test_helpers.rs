//! Test helpers.

use std::sync::Arc;

use actix_web::http::header::AUTHORIZATION;
use chrono::Utc;

use crate::auth::issue_token;
use crate::config::AuthSettings;
use crate::db::{MockCollectionStore, MockCouponStore, MockProductStore, MockUserStore};
use crate::models::{CartItem, Product, Role, UserProfile};
use crate::payment::MockPaymentGateway;
use crate::storage::MockObjectStorage;
use crate::AppState;

pub(crate) fn test_settings() -> AuthSettings {
    AuthSettings {
        jwt_secret: "test-signing-key".to_string(),
        token_ttl_hours: 1,
        cookie_secure: false,
    }
}

pub(crate) fn profile(id: &str, role: Role) -> UserProfile {
    UserProfile {
        id: id.to_string(),
        name: "Asha".to_string(),
        email: format!("{id}@example.com"),
        role,
        cart: Vec::new(),
        orders: Vec::new(),
    }
}

pub(crate) fn profile_with_cart(id: &str, cart: &[&str]) -> UserProfile {
    UserProfile {
        cart: cart
            .iter()
            .map(|product_id| CartItem {
                product_id: (*product_id).to_string(),
                count: 1,
            })
            .collect(),
        ..profile(id, Role::Customer)
    }
}

pub(crate) fn product(id: &str, name: &str, price: f64) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        price,
        description: format!("{name} description"),
        collection_id: "c1".to_string(),
        photos: Vec::new(),
        created_at: Utc::now(),
    }
}

/// Mocks with no expectations fail the test if they are touched.
#[derive(Default)]
pub(crate) struct Mocks {
    pub users: MockUserStore,
    pub products: MockProductStore,
    pub collections: MockCollectionStore,
    pub coupons: MockCouponStore,
    pub payments: MockPaymentGateway,
    pub storage: MockObjectStorage,
}

impl Mocks {
    /// Users mock that resolves `user` for the auth middleware on every call.
    pub(crate) fn signed_in_as(user: UserProfile) -> Self {
        let mut mocks = Mocks::default();
        mocks
            .users
            .expect_find_profile()
            .returning(move |_| Ok(Some(user.clone())));
        mocks
    }

    pub(crate) fn into_state(self) -> AppState {
        AppState {
            users: Arc::new(self.users),
            products: Arc::new(self.products),
            collections: Arc::new(self.collections),
            coupons: Arc::new(self.coupons),
            payments: Arc::new(self.payments),
            storage: Arc::new(self.storage),
            auth: test_settings(),
            currency: "INR".to_string(),
        }
    }
}

pub(crate) fn state_with_users(users: MockUserStore) -> AppState {
    Mocks {
        users,
        ..Mocks::default()
    }
    .into_state()
}

/// Builds the full route table over the given mocks.
macro_rules! test_app {
    ($mocks:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($mocks.into_state()))
                .configure($crate::configure),
        )
        .await
    };
}
pub(crate) use test_app;

pub(crate) fn bearer(user_id: &str) -> (actix_web::http::header::HeaderName, String) {
    let token = issue_token(&test_settings(), user_id, Role::Customer).unwrap_or_default();
    (AUTHORIZATION, format!("Bearer {token}"))
}

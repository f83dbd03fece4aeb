use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

/// One product reference held in a cart or in the orders list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub count: i32,
}

/// Full user document, including the credential hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub cart: Vec<CartItem>,
    #[serde(default)]
    pub orders: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
}

/// The projection of a user that is safe to hand to handlers and clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub cart: Vec<CartItem>,
    #[serde(default)]
    pub orders: Vec<CartItem>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            cart: user.cart.clone(),
            orders: user.orders.clone(),
        }
    }
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Appends a fresh entry with count 1. Returns `false` without touching
    /// the cart when the product is already in it.
    pub fn add_to_cart(&mut self, product_id: &str) -> bool {
        if self.cart.iter().any(|item| item.product_id == product_id) {
            return false;
        }
        self.cart.push(CartItem {
            product_id: product_id.to_string(),
            count: 1,
        });
        true
    }

    /// Sets the count of the matching entry; unknown products are ignored.
    pub fn set_cart_count(&mut self, product_id: &str, count: i32) {
        for item in self.cart.iter_mut().filter(|item| item.product_id == product_id) {
            item.count = count;
        }
    }

    pub fn remove_from_cart(&mut self, product_id: &str) {
        self.cart.retain(|item| item.product_id != product_id);
    }

    /// Moves every cart entry, in order, onto the end of the orders list.
    pub fn move_cart_to_orders(&mut self) -> usize {
        let moved = self.cart.len();
        self.orders.append(&mut self.cart);
        moved
    }
}

#[derive(Debug, Deserialize)]
pub struct SignUpInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub role: Role,
    pub exp: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub secure_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub collection_id: String,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionInput {
    pub name: String,
}

/// Stored for administration only; checkout never reads coupons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    #[serde(rename = "_id")]
    pub id: String,
    pub code: String,
    pub discount: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CouponInput {
    pub code: String,
    pub discount: i32,
}

#[derive(Debug, Deserialize)]
pub struct CartCountInput {
    pub count: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    #[serde(default)]
    pub product_ids: Vec<String>,
}

/// Confirmation posted back by the client after the gateway's checkout.
#[derive(Debug, Default, Deserialize)]
pub struct PaymentConfirmation {
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
}

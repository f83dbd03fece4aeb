//! Payment gateway seam and its Razorpay implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use mockall::automock;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::config::RazorpayConfig;
use crate::error::AppError;
use crate::models::Product;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway rejected the request: {0}")]
    Rejected(String),
}

/// Body sent to the gateway to open a payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    /// Minor currency units.
    pub amount: u64,
    pub currency: String,
    pub receipt: String,
}

impl OrderRequest {
    pub fn new(amount: u64, currency: &str, now: DateTime<Utc>) -> Self {
        OrderRequest {
            amount,
            currency: currency.to_string(),
            receipt: format!("receipt_{}", now.timestamp_millis()),
        }
    }
}

/// Handle returned by the gateway for a pending payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: u64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[automock]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError>;

    /// Checks the signature the gateway attached to a completed payment.
    fn verify_payment(&self, order_id: &str, payment_id: &str, signature: &str) -> bool;
}

/// Sums current catalog prices and converts them to minor units.
pub fn bill_amount(products: &[Product]) -> Result<u64, AppError> {
    let total: f64 = products.iter().map(|p| p.price).sum();

    // coupons are stored but never discounted here
    if total == 0.0 {
        return Err(AppError::Validation("Amount to bill is 0".to_string()));
    }
    if !total.is_finite() || total < 0.0 {
        return Err(AppError::Validation("Invalid amount to bill".to_string()));
    }

    Ok((total * 100.0).round() as u64)
}

#[derive(Clone)]
pub struct RazorpayClient {
    config: RazorpayConfig,
    http: reqwest::Client,
}

impl std::fmt::Debug for RazorpayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RazorpayClient").field("config", &self.config).finish()
    }
}

impl RazorpayClient {
    pub fn new(config: RazorpayConfig) -> Self {
        RazorpayClient {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        let response = self
            .http
            .post(format!("{}/orders", self.config.api_url))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected(format!("{status}: {text}")));
        }

        let order: GatewayOrder = response.json().await?;
        log::info!("Created gateway order {} for {} {}", order.id, order.amount, order.currency);
        Ok(order)
    }

    fn verify_payment(&self, order_id: &str, payment_id: &str, signature: &str) -> bool {
        let Ok(provided) = hex::decode(signature) else {
            return false;
        };
        signature_mac(&self.config.key_secret, order_id, payment_id)
            .is_some_and(|mac| mac.verify_slice(&provided).is_ok())
    }
}

fn signature_mac(key_secret: &str, order_id: &str, payment_id: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key_secret.as_bytes()).ok()?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Some(mac)
}

/// Hex HMAC-SHA256 of `"<order_id>|<payment_id>"`.
pub fn payment_signature(key_secret: &str, order_id: &str, payment_id: &str) -> Option<String> {
    signature_mac(key_secret, order_id, payment_id).map(|mac| hex::encode(mac.finalize().into_bytes()))
}

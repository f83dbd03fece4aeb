//! The single error type every handler and the auth middleware return.
//!
//! `AppError` implements [`ResponseError`], so whatever escapes a handler is
//! rendered as `{ "success": false, "message": ... }` with the matching status.

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::db::StoreError;
use crate::payment::GatewayError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("Upload failed: {0}")]
    Upload(#[from] StorageError),

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Database error: {0}")]
    Database(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Not authorized to access this route".to_string())
    }

    fn public_message(&self) -> String {
        match self {
            AppError::Upload(_) => "Image upload failed".to_string(),
            AppError::Gateway(_) => "Error in placing the order".to_string(),
            AppError::Database(_) | AppError::Internal(_) => "Internal Server Error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Upload(_)
            | AppError::Gateway(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(json!({
            "success": false,
            "message": self.public_message(),
        }))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Extractor configuration that routes malformed bodies and path segments
/// through the same envelope as handler errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    AppError::NotFound(format!("No route for {} {}", req.method(), req.path())).error_response()
}

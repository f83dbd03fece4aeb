//! Request handlers, one module per resource.
//!
//! Every handler returns `Result<HttpResponse, AppError>`; success bodies are
//! `{ "success": true, ... }`.

pub mod auth;
pub mod cart;
pub mod collections;
pub mod coupons;
pub mod orders;
pub mod products;

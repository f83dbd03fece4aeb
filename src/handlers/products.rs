use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use futures::future::try_join_all;
use futures::TryStreamExt;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{Photo, Product};
use crate::storage::{photo_key, Upload};
use crate::AppState;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Decoded multipart body of a product creation request.
#[derive(Debug, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub collection_id: Option<String>,
    pub images: Vec<FormImage>,
}

#[derive(Debug)]
pub struct FormImage {
    pub body: Vec<u8>,
    pub content_type: String,
}

struct NewProduct {
    name: String,
    price: f64,
    description: String,
    collection_id: String,
}

fn required(value: Option<String>) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation("Please fill all details".to_string()))
}

impl ProductForm {
    fn validate(self) -> Result<(NewProduct, Vec<FormImage>)> {
        let name = required(self.name)?;
        let price = required(self.price)?;
        let description = required(self.description)?;
        let collection_id = required(self.collection_id)?;

        let price: f64 = price
            .parse()
            .map_err(|_| AppError::Validation("Price must be a number".to_string()))?;
        if !price.is_finite() || price <= 0.0 {
            return Err(AppError::Validation("Price must be greater than 0".to_string()));
        }

        Ok((
            NewProduct {
                name,
                price,
                description,
                collection_id,
            },
            self.images,
        ))
    }
}

/// Caps applied while buffering a product form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormLimits {
    pub image_bytes: usize,
    pub text_bytes: usize,
    pub total_bytes: usize,
}

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_TEXT_FIELD_BYTES: usize = 16 * 1024;
pub const MAX_FORM_BYTES: usize = 20 * 1024 * 1024;

impl Default for FormLimits {
    fn default() -> Self {
        FormLimits {
            image_bytes: MAX_IMAGE_BYTES,
            text_bytes: MAX_TEXT_FIELD_BYTES,
            total_bytes: MAX_FORM_BYTES,
        }
    }
}

/// Reads text fields by name; every part with a filename is an image.
/// Stops at the first part or running total that exceeds `limits`.
pub async fn read_product_form(mut payload: Multipart, limits: FormLimits) -> Result<ProductForm> {
    let mut form = ProductForm::default();
    let mut total = 0usize;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let disposition = field.content_disposition().cloned();
        let is_image = disposition.as_ref().and_then(|d| d.get_filename()).is_some();
        let content_type = field
            .content_type()
            .map(ToString::to_string)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        let part_limit = if is_image { limits.image_bytes } else { limits.text_bytes };

        let mut body = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| AppError::Validation(e.to_string()))?
        {
            total += chunk.len();
            if body.len() + chunk.len() > part_limit {
                let what = if is_image { "Image" } else { "Form field" };
                return Err(AppError::PayloadTooLarge(format!(
                    "{what} is larger than {part_limit} bytes"
                )));
            }
            if total > limits.total_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "Form is larger than {} bytes",
                    limits.total_bytes
                )));
            }
            body.extend_from_slice(&chunk);
        }

        if is_image {
            if !body.is_empty() {
                form.images.push(FormImage { body, content_type });
            }
            continue;
        }

        let value = String::from_utf8(body)
            .map_err(|_| AppError::Validation("Form fields must be UTF-8".to_string()))?;
        match disposition.as_ref().and_then(|d| d.get_name()) {
            Some("name") => form.name = Some(value),
            Some("price") => form.price = Some(value),
            Some("description") => form.description = Some(value),
            Some("collectionId") => form.collection_id = Some(value),
            _ => {}
        }
    }

    Ok(form)
}

/// Validates the form, uploads every image concurrently, then stores the
/// product. A failed upload aborts the request; images that already made it
/// to storage stay there.
pub async fn create_product(state: &AppState, form: ProductForm) -> Result<Product> {
    let (fields, images) = form.validate()?;
    let product_id = Uuid::new_v4().to_string();

    let uploads = images.into_iter().enumerate().map(|(index, image)| {
        state.storage.put(Upload {
            key: photo_key(&product_id, index),
            body: image.body,
            content_type: image.content_type,
        })
    });
    let photos = try_join_all(uploads)
        .await
        .map_err(|e| {
            log::warn!("Photo upload failed for product {product_id}: {e}");
            AppError::from(e)
        })?
        .into_iter()
        .map(|secure_url| Photo { secure_url })
        .collect();

    let product = Product {
        id: product_id,
        name: fields.name,
        price: fields.price,
        description: fields.description,
        collection_id: fields.collection_id,
        photos,
        created_at: Utc::now(),
    };
    state.products.insert(&product).await?;
    log::info!("Created product {}", product.id);

    Ok(product)
}

pub async fn add_product(
    state: web::Data<AppState>,
    _user: CurrentUser,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = read_product_form(payload, FormLimits::default()).await?;
    let product = create_product(&state, form).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "product": product })))
}

pub async fn get_all_products(state: web::Data<AppState>, user: CurrentUser) -> Result<HttpResponse> {
    let products = state.products.list().await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "products": products,
        "user": user.0,
    })))
}

pub async fn get_product_by_id(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse> {
    let product = state
        .products
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("No product was found".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "product": product })))
}

pub async fn search_products(
    state: web::Data<AppState>,
    search_text: web::Path<String>,
) -> Result<HttpResponse> {
    let products = state.products.search(&search_text).await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "products": products })))
}

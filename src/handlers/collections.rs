use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Collection, CollectionInput};
use crate::AppState;

const MAX_NAME_LENGTH: usize = 120;

fn collection_name(input: &CollectionInput) -> Result<String> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Collection name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Collection name should not be more than {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

pub async fn create_collection(
    state: web::Data<AppState>,
    input: web::Json<CollectionInput>,
) -> Result<HttpResponse> {
    let collection = Collection {
        id: Uuid::new_v4().to_string(),
        name: collection_name(&input)?,
        created_at: Utc::now(),
    };
    state.collections.insert(&collection).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Collection created successfully",
        "collection": collection,
    })))
}

pub async fn get_all_collections(state: web::Data<AppState>) -> Result<HttpResponse> {
    let collections = state.collections.list().await?;

    Ok(HttpResponse::Ok().json(json!({ "success": true, "collections": collections })))
}

pub async fn update_collection(
    state: web::Data<AppState>,
    id: web::Path<String>,
    input: web::Json<CollectionInput>,
) -> Result<HttpResponse> {
    let name = collection_name(&input)?;
    let collection = state
        .collections
        .rename(&id, &name)
        .await?
        .ok_or_else(|| AppError::NotFound("Collection not found".to_string()))?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Collection updated successfully",
        "collection": collection,
    })))
}

pub async fn delete_collection(state: web::Data<AppState>, id: web::Path<String>) -> Result<HttpResponse> {
    if !state.collections.delete(&id).await? {
        return Err(AppError::NotFound("Collection not found".to_string()));
    }

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Collection deleted successfully",
    })))
}

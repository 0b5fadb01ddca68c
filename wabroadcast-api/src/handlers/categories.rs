use crate::database::categories as categories_db;
use crate::database::{Database, DbError};
use crate::helpers::ApiError;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use shared_types::{ApiEnvelope, CreateCategoryRequest, EntityType, UpdateCategoryRequest};
use std::sync::Arc;
use tracing::info;

const MAX_NAME_LEN: usize = 20;

fn validate_name(name: &str) -> Result<&str, ApiError> {
    let name = name.trim();
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        return Err(ApiError::bad_request(
            "VALIDATION_ERROR",
            format!("Category name must be 1 to {} characters", MAX_NAME_LEN),
        ));
    }
    Ok(name)
}

fn category_not_found(err: DbError) -> ApiError {
    match err {
        DbError::NotFound => ApiError::not_found("CATEGORY_NOT_FOUND", "Category not found"),
        other => other.into(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCategoriesQuery {
    entity_type: Option<EntityType>,
}

pub async fn list_categories(
    db: web::Data<Arc<Database>>,
    query: web::Query<ListCategoriesQuery>,
) -> Result<HttpResponse, ApiError> {
    let categories =
        categories_db::list_categories(db.async_connection.clone(), query.entity_type).await?;

    let count = categories.len();
    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(categories).with_count(count)))
}

pub async fn create_category(
    db: web::Data<Arc<Database>>,
    request: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let name = validate_name(&request.name)?;

    let category = categories_db::insert_category(
        db.async_connection.clone(),
        name,
        request.entity_type.unwrap_or_default(),
    )
    .await?;

    info!("Created category {} ({})", category.id, category.name);

    Ok(HttpResponse::Created().json(ApiEnvelope::ok(category).with_message("Category created")))
}

pub async fn update_category(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
    request: web::Json<UpdateCategoryRequest>,
) -> Result<HttpResponse, ApiError> {
    let category_id = path.into_inner();
    let name = request.name.as_deref().map(validate_name).transpose()?;

    let category = categories_db::update_category(
        db.async_connection.clone(),
        category_id,
        name,
        request.entity_type,
        request.is_active,
    )
    .await
    .map_err(category_not_found)?;

    Ok(HttpResponse::Ok().json(ApiEnvelope::ok(category).with_message("Category updated")))
}

pub async fn delete_category(
    db: web::Data<Arc<Database>>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let category_id = path.into_inner();

    categories_db::delete_category(db.async_connection.clone(), category_id)
        .await
        .map_err(category_not_found)?;

    info!("Deleted category {}", category_id);

    Ok(HttpResponse::Ok().json(ApiEnvelope::empty("Category deleted")))
}

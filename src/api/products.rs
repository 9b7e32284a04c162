use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{CreateProductRequest, Product};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_name, validate_price, validate_stock, validate_uuid};

/// Validate a CreateProductRequest
fn validate_create_request(req: &CreateProductRequest) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_name(&req.name) {
        errors.add("name", &e);
    }

    if req.description.is_empty() {
        errors.add("description", "Description is required");
    }

    if let Err(e) = validate_uuid(&req.category_id, "category_id") {
        errors.add("category_id", &e);
    }

    if let Err(e) = validate_price(req.price) {
        errors.add("price", &e);
    }

    if let Err(e) = validate_stock(req.stock) {
        errors.add("stock", &e);
    }

    errors.finish()
}

/// List all products
///
/// GET /api/products
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at, id")
        .fetch_all(&state.db)
        .await?;

    Ok(Json(products))
}

/// Get a single product
///
/// GET /api/products/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    if let Err(e) = validate_uuid(&id, "product_id") {
        return Err(ApiError::validation_field("product_id", e));
    }

    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    Ok(Json(product))
}

/// List products belonging to a category
///
/// GET /api/products/category/:id
pub async fn list_products_by_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    if let Err(e) = validate_uuid(&category_id, "category_id") {
        return Err(ApiError::validation_field("category_id", e));
    }

    let products = sqlx::query_as::<_, Product>(
        "SELECT * FROM products WHERE category_id = ? ORDER BY created_at, id",
    )
    .bind(&category_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(products))
}

/// Create a product
///
/// POST /api/products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    validate_create_request(&req)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, name, description, category_id, price, stock, image, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.description)
    .bind(&req.category_id)
    .bind(req.price)
    .bind(req.stock)
    .bind(&req.image)
    .bind(&now)
    .bind(&now)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(product_id = %product.id, name = %product.name, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::{self, CategoryNode};
use crate::db::{Category, CreateCategoryRequest, UpdateCategoryRequest};
use crate::AppState;

use super::error::{ApiError, ValidationErrorBuilder};
use super::validation::{validate_name, validate_uuid};

/// List all categories as a nested forest
///
/// GET /api/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryNode>>, ApiError> {
    let categories =
        sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY created_at, id")
            .fetch_all(&state.db)
            .await?;

    let forest = catalog::build_tree(&categories);
    if forest.is_empty() {
        // An empty catalog answers 404; see DESIGN.md
        return Err(ApiError::not_found("No categories found"));
    }

    Ok(Json(forest))
}

/// Get a single category (flat, without children)
///
/// GET /api/categories/:id
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Category>, ApiError> {
    if let Err(e) = validate_uuid(&id, "category_id") {
        return Err(ApiError::validation_field("category_id", e));
    }

    let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    Ok(Json(category))
}

/// Create a category. A null or empty parent_id makes a root category.
///
/// POST /api/categories
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    if let Err(e) = validate_name(&req.name) {
        errors.add("name", &e);
    }
    if let Some(ref parent_id) = req.parent_id {
        // Empty string means "root", same as omitting the field
        if !parent_id.is_empty() {
            if let Err(e) = validate_uuid(parent_id, "parent_id") {
                errors.add("parent_id", &e);
            }
        }
    }
    errors.finish()?;

    let parent_id = req.parent_id.filter(|p| !p.is_empty());

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name, parent_id, description, image, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&parent_id)
    .bind(&req.description)
    .bind(&req.image)
    .bind(&now)
    .bind(&now)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(category_id = %category.id, name = %category.name, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// Update a category. Only provided fields change; an empty parent_id
/// clears the parent, making the category a root.
///
/// PUT /api/categories
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateCategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    if let Err(e) = validate_uuid(&req.id, "id") {
        return Err(ApiError::validation_field("id", e));
    }
    if let Some(ref name) = req.name {
        if let Err(e) = validate_name(name) {
            return Err(ApiError::validation_field("name", e));
        }
    }

    let existing = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
        .bind(&req.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Category not found"))?;

    let name = req.name.unwrap_or(existing.name);
    let parent_id = match req.parent_id {
        Some(p) if p.is_empty() => None,
        Some(p) => Some(p),
        None => existing.parent_id,
    };
    let description = req.description.or(existing.description);
    let image = req.image.or(existing.image);
    let now = chrono::Utc::now().to_rfc3339();

    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = ?, parent_id = ?, description = ?, image = ?, updated_at = ?
         WHERE id = ? RETURNING *",
    )
    .bind(&name)
    .bind(&parent_id)
    .bind(&description)
    .bind(&image)
    .bind(&now)
    .bind(&req.id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(category))
}

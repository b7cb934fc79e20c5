//! Category route handlers.
//!
//! Public reads of the category tree; admin-gated writes. Create and
//! update accept multipart because a category may carry one image.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::instrument;

use banyan_core::CategoryId;

use crate::db::categories::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::AdminUser;
use crate::models::category::{Category, slugify};
use crate::state::AppState;

/// Folder namespace on the asset host.
const CATEGORIES_FOLDER: &str = "categories";

/// Fields pulled out of a category multipart body.
#[derive(Debug, Default)]
struct CategoryForm {
    name: Option<String>,
    description: Option<String>,
    parent: Option<String>,
    image: Option<(String, Vec<u8>)>,
}

/// List all categories ordered by name.
///
/// GET /api/categories
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

/// Get a single category.
///
/// GET /api/categories/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    let category = CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    Ok(Json(category))
}

/// Create a category.
///
/// POST /api/categories (multipart: name, description?, parent?, image?)
#[instrument(skip_all, fields(admin = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = read_category_form(multipart).await?;

    let name = form
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Validation("Name is required".to_string()))?;
    let parent = parse_parent(form.parent.as_deref())?;

    let image = match form.image {
        Some((filename, bytes)) => Some(
            state
                .assets()
                .store("image", &filename, bytes, CATEGORIES_FOLDER)
                .await
                .map_err(|e| AppError::Internal(format!("image storage failed: {e}")))?
                .url,
        ),
        None => None,
    };

    let now = Utc::now();
    let category = Category {
        id: CategoryId::generate(),
        name: name.to_owned(),
        slug: slugify(name),
        description: form.description.filter(|d| !d.trim().is_empty()),
        image,
        parent,
        created_at: now,
        updated_at: now,
    };

    CategoryRepository::new(state.pool())
        .create(&category)
        .await?;
    tracing::info!(category = %category.id, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// Update a category. The slug is recomputed whenever the name changes.
///
/// PUT /api/categories/{id}
#[instrument(skip_all, fields(admin = %admin.id, category = %id))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<CategoryId>,
    multipart: Multipart,
) -> Result<Json<Category>> {
    let form = read_category_form(multipart).await?;

    let repo = CategoryRepository::new(state.pool());
    let mut category = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".to_string()))?;

    if let Some(name) = form.name.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty()) {
        category.slug = slugify(&name);
        category.name = name;
    }
    if let Some(description) = form.description {
        category.description = Some(description).filter(|d| !d.trim().is_empty());
    }
    if let Some(parent) = form.parent.as_deref() {
        category.parent = parse_parent(Some(parent))?;
    }
    if let Some((filename, bytes)) = form.image {
        category.image = Some(
            state
                .assets()
                .store("image", &filename, bytes, CATEGORIES_FOLDER)
                .await
                .map_err(|e| AppError::Internal(format!("image storage failed: {e}")))?
                .url,
        );
    }

    repo.save(&category).await?;
    Ok(Json(category))
}

/// Delete a category; blocked while any child still points at it.
///
/// DELETE /api/categories/{id}
#[instrument(skip_all, fields(admin = %admin.id, category = %id))]
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<CategoryId>,
) -> Result<impl IntoResponse> {
    let repo = CategoryRepository::new(state.pool());

    if repo.get(id).await?.is_none() {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    if repo.has_children(id).await? {
        return Err(AppError::Validation(
            "Cannot delete category with subcategories".to_string(),
        ));
    }

    repo.delete(id).await?;
    Ok(Json(serde_json::json!({ "message": "Category removed" })))
}

/// Drain a category multipart body.
async fn read_category_form(mut multipart: Multipart) -> Result<CategoryForm> {
    let mut form = CategoryForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Error reading form: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "name" => form.name = Some(read_text(field).await?),
            "description" => form.description = Some(read_text(field).await?),
            "parent" => form.parent = Some(read_text(field).await?),
            "image" => {
                let is_image = field
                    .content_type()
                    .is_some_and(|ct| ct.starts_with("image/"));
                if !is_image {
                    return Err(AppError::Validation(
                        "Only image files are allowed!".to_string(),
                    ));
                }
                let filename = field.file_name().unwrap_or("image").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Error reading image: {e}")))?;
                form.image = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form field: {e}")))
}

/// An empty parent field clears the reference; anything else must be a
/// valid category ID.
fn parse_parent(value: Option<&str>) -> Result<Option<CategoryId>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => CategoryId::parse(raw)
            .map(Some)
            .map_err(|_| AppError::Validation("Invalid parent category ID".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parent_empty_clears() {
        assert_eq!(parse_parent(None).unwrap(), None);
        assert_eq!(parse_parent(Some("")).unwrap(), None);
        assert_eq!(parse_parent(Some("  ")).unwrap(), None);
    }

    #[test]
    fn test_parse_parent_rejects_garbage() {
        assert!(parse_parent(Some("not-a-uuid")).is_err());
        let id = CategoryId::generate();
        assert_eq!(parse_parent(Some(&id.to_string())).unwrap(), Some(id));
    }
}

//! Product route handlers.
//!
//! Public catalog reads, admin-gated catalog writes (multipart, because
//! create/update carry image files), and the rating endpoints.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use banyan_core::{ProductCategory, ProductId};

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::{AdminUser, AuthUser};
use crate::models::product::Product;
use crate::services::ratings::RatingService;
use crate::state::AppState;

/// Upload limits, matching what the storefront clients were built against.
const MAX_IMAGES: usize = 5;
const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Folder namespace on the asset host.
const PRODUCTS_FOLDER: &str = "products";

// =============================================================================
// Catalog Reads
// =============================================================================

/// List all products, newest first.
///
/// GET /api/products
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list().await?;
    Ok(Json(products))
}

/// Get a single product.
///
/// GET /api/products/{id}
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

// =============================================================================
// Catalog Writes (admin, multipart)
// =============================================================================

/// Text fields and image files pulled out of a multipart body.
#[derive(Debug, Default)]
struct ProductForm {
    name: Option<String>,
    description: Option<String>,
    price: Option<String>,
    category: Option<String>,
    stock: Option<String>,
    images: Vec<(String, Vec<u8>)>,
}

/// Create a product.
///
/// POST /api/products (multipart: name, description, price, category,
/// stock, images[])
#[instrument(skip_all, fields(admin = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    let form = read_product_form(multipart).await?;

    let name = require_text(form.name.as_deref(), "Name is required")?;
    let description = require_text(form.description.as_deref(), "Description is required")?;
    let price = parse_price(form.price.as_deref())?;
    let category = parse_category(form.category.as_deref())?;
    let stock = parse_stock(form.stock.as_deref())?;

    if form.images.is_empty() {
        return Err(AppError::Validation(
            "At least one image is required".to_string(),
        ));
    }

    let images = store_images(&state, form.images).await?;

    let now = Utc::now();
    let product = Product {
        id: ProductId::generate(),
        name: name.to_owned(),
        description: description.to_owned(),
        price,
        category,
        stock,
        images,
        ratings: Vec::new(),
        average_rating: None,
        created_at: now,
        updated_at: now,
    };

    ProductRepository::new(state.pool()).create(&product).await?;
    tracing::info!(product = %product.id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product. Supplied fields replace stored ones; a non-empty
/// set of uploaded images replaces the image list wholesale.
///
/// PUT /api/products/{id}
#[instrument(skip_all, fields(admin = %admin.id, product = %id))]
pub async fn update(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Json<Product>> {
    let form = read_product_form(multipart).await?;

    let repo = ProductRepository::new(state.pool());
    let mut product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    if !form.images.is_empty() {
        product.images = store_images(&state, form.images).await?;
    }

    if let Some(name) = form.name.filter(|n| !n.trim().is_empty()) {
        product.name = name;
    }
    if let Some(description) = form.description.filter(|d| !d.trim().is_empty()) {
        product.description = description;
    }
    if form.price.is_some() {
        product.price = parse_price(form.price.as_deref())?;
    }
    if form.category.is_some() {
        product.category = parse_category(form.category.as_deref())?;
    }
    if form.stock.is_some() {
        product.stock = parse_stock(form.stock.as_deref())?;
    }

    repo.save(&product).await?;
    Ok(Json(product))
}

/// Delete a product, best-effort removing its remote images first.
///
/// DELETE /api/products/{id}
#[instrument(skip_all, fields(admin = %admin.id, product = %id))]
pub async fn delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    // Image cleanup never blocks the delete; AssetStore logs failures.
    for url in &product.images {
        state.assets().delete(url).await;
    }

    if !repo.delete(id).await? {
        return Err(AppError::NotFound(
            "Product not found or already deleted".to_string(),
        ));
    }

    Ok(Json(serde_json::json!({
        "message": "Product deleted successfully",
        "product": product,
    })))
}

// =============================================================================
// Ratings
// =============================================================================

/// Rating request body.
#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub rating: u8,
}

/// Rate a product (1-5); a repeat call replaces the caller's entry.
///
/// POST /api/products/{id}/rate
#[instrument(skip(state, user), fields(user = %user.id, product = %id))]
pub async fn rate(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<ProductId>,
    Json(body): Json<RateRequest>,
) -> Result<impl IntoResponse> {
    let average = RatingService::new(state.pool())
        .rate(id, user.id, body.rating)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Rating saved successfully",
        "averageRating": average,
    })))
}

/// The caller's own rating of a product.
///
/// GET /api/products/{id}/userRating
pub async fn user_rating(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let rating = RatingService::new(state.pool())
        .user_rating(id, user.id)
        .await
        .map_err(|e| match e {
            crate::services::ratings::RatingError::NotFound => {
                AppError::NotFound("Rating not found".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(serde_json::json!({ "rating": rating })))
}

// =============================================================================
// Multipart Helpers
// =============================================================================

/// Drain a multipart body into text fields and image bytes, enforcing
/// the image-only filter and per-file size cap.
async fn read_product_form(mut multipart: Multipart) -> Result<ProductForm> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Error uploading images: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "name" => form.name = Some(read_text(field).await?),
            "description" => form.description = Some(read_text(field).await?),
            "price" => form.price = Some(read_text(field).await?),
            "category" => form.category = Some(read_text(field).await?),
            "stock" => form.stock = Some(read_text(field).await?),
            "images" => {
                if form.images.len() >= MAX_IMAGES {
                    return Err(AppError::Validation(format!(
                        "At most {MAX_IMAGES} images are allowed"
                    )));
                }

                let is_image = field
                    .content_type()
                    .is_some_and(|ct| ct.starts_with("image/"));
                if !is_image {
                    return Err(AppError::Validation(
                        "Only image files are allowed!".to_string(),
                    ));
                }

                let filename = field.file_name().unwrap_or("image").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Error uploading images: {e}"))
                })?;
                if bytes.len() > MAX_IMAGE_BYTES {
                    return Err(AppError::Validation(
                        "Image exceeds the 5MB size limit".to_string(),
                    ));
                }

                form.images.push((filename, bytes.to_vec()));
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

/// Upload image files concurrently, returning their public URLs in order.
async fn store_images(state: &AppState, images: Vec<(String, Vec<u8>)>) -> Result<Vec<String>> {
    let uploads = images.into_iter().map(|(filename, bytes)| {
        let assets = state.assets();
        async move {
            assets
                .store("images", &filename, bytes, PRODUCTS_FOLDER)
                .await
        }
    });

    let stored = futures::future::join_all(uploads).await;

    let mut urls = Vec::with_capacity(stored.len());
    for result in stored {
        let asset =
            result.map_err(|e| AppError::Internal(format!("image storage failed: {e}")))?;
        urls.push(asset.url);
    }

    Ok(urls)
}

// =============================================================================
// Field Parsers
// =============================================================================

fn require_text<'a>(value: Option<&'a str>, message: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

fn parse_price(value: Option<&str>) -> Result<Decimal> {
    let price = value
        .and_then(|v| v.trim().parse::<Decimal>().ok())
        .ok_or_else(|| AppError::Validation("Price must be a positive number".to_string()))?;
    if price < Decimal::ZERO {
        return Err(AppError::Validation(
            "Price must be a positive number".to_string(),
        ));
    }
    Ok(price)
}

fn parse_category(value: Option<&str>) -> Result<ProductCategory> {
    value
        .and_then(|v| v.trim().parse::<ProductCategory>().ok())
        .ok_or_else(|| AppError::Validation("Invalid category".to_string()))
}

fn parse_stock(value: Option<&str>) -> Result<i32> {
    let stock = value
        .and_then(|v| v.trim().parse::<i32>().ok())
        .ok_or_else(|| {
            AppError::Validation("Stock must be a non-negative integer".to_string())
        })?;
    if stock < 0 {
        return Err(AppError::Validation(
            "Stock must be a non-negative integer".to_string(),
        ));
    }
    Ok(stock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_price_rejects_negative_and_garbage() {
        assert!(parse_price(Some("12.50")).is_ok());
        assert!(parse_price(Some("0")).is_ok());
        assert!(parse_price(Some("-1")).is_err());
        assert!(parse_price(Some("twelve")).is_err());
        assert!(parse_price(None).is_err());
    }

    #[test]
    fn test_parse_stock_rejects_negative_and_fractions() {
        assert_eq!(parse_stock(Some("7")).unwrap(), 7);
        assert_eq!(parse_stock(Some("0")).unwrap(), 0);
        assert!(parse_stock(Some("-3")).is_err());
        assert!(parse_stock(Some("2.5")).is_err());
        assert!(parse_stock(None).is_err());
    }

    #[test]
    fn test_parse_category_uses_display_names() {
        assert_eq!(
            parse_category(Some("Forest Goods")).unwrap(),
            ProductCategory::ForestGoods
        );
        assert!(parse_category(Some("Electronics")).is_err());
    }

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text(Some("  Bamboo  "), "msg").unwrap(), "Bamboo");
        assert!(require_text(Some("   "), "msg").is_err());
        assert!(require_text(None, "msg").is_err());
    }
}

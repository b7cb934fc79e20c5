//! User self-service route handlers: profile, password change, account
//! deletion, and the wishlist.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use banyan_core::{Email, ProductId, Role, UserId};

use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::product::Product;
use crate::models::user::{Address, User};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Country assumed when a profile never set one.
const DEFAULT_COUNTRY: &str = "India";

// =============================================================================
// Profile
// =============================================================================

/// Profile wire shape: the account plus its address flattened the way
/// the storefront forms expect it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub is_verified: bool,
    pub phone_number: String,
    /// Street line; the nested address is flattened for the client.
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub wishlist: Vec<ProductId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        let address = user.address.clone().unwrap_or_default();
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_verified: user.is_verified,
            phone_number: user.phone.clone().unwrap_or_default(),
            address: address.street.unwrap_or_default(),
            city: address.city.unwrap_or_default(),
            state: address.state.unwrap_or_default(),
            postal_code: address.zip_code.unwrap_or_default(),
            country: address.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            wishlist: user.wishlist.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Profile update request, in the same flat shape.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// The calling user's profile.
///
/// GET /api/users/profile
pub async fn get_profile(AuthUser(user): AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse::from(&user))
}

/// Update the calling user's profile.
///
/// PUT /api/users/profile
///
/// Supplied fields overwrite stored ones; address parts merge into the
/// nested address record. An email change to an address another account
/// holds is rejected.
#[instrument(skip_all, fields(user = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    let repo = UserRepository::new(state.pool());

    if let Some(name) = body.name.filter(|n| !n.trim().is_empty()) {
        user.name = name.trim().to_owned();
    }
    if let Some(phone) = body.phone_number.filter(|p| !p.trim().is_empty()) {
        user.phone = Some(phone.trim().to_owned());
    }

    user.address = Some(merge_address(user.address.take(), &body));

    if let Some(raw_email) = body.email.filter(|e| !e.trim().is_empty()) {
        let new_email = Email::parse(&raw_email).map_err(AuthError::InvalidEmail)?;
        if new_email != user.email {
            if repo.get_by_email(&new_email).await?.is_some() {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
            user.email = new_email;
        }
    }

    repo.save(&user).await?;
    Ok(Json(ProfileResponse::from(&user)))
}

/// Merge flat request fields into the stored address, keeping old values
/// where the request is silent.
fn merge_address(existing: Option<Address>, body: &UpdateProfileRequest) -> Address {
    let existing = existing.unwrap_or_default();
    let pick = |new: &Option<String>, old: Option<String>| {
        new.as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .or(old)
    };

    Address {
        street: pick(&body.address, existing.street),
        city: pick(&body.city, existing.city),
        state: pick(&body.state, existing.state),
        zip_code: pick(&body.postal_code, existing.zip_code),
        country: pick(&body.country, existing.country)
            .or_else(|| Some(DEFAULT_COUNTRY.to_string())),
    }
}

// =============================================================================
// Password & Account
// =============================================================================

/// Password change request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Change the calling user's password.
///
/// POST /api/users/change-password
#[instrument(skip_all, fields(user = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    let auth = AuthService::new(state.pool(), state.tokens());
    auth.change_password(&mut user, &body.current_password, &body.new_password)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => {
                AppError::Validation("Current password is incorrect".to_string())
            }
            other => other.into(),
        })?;

    Ok(Json(serde_json::json!({
        "message": "Password updated successfully"
    })))
}

/// Hard-delete the calling user's account. Orders are retained.
///
/// DELETE /api/users/delete-account
#[instrument(skip_all, fields(user = %user.id))]
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse> {
    let deleted = UserRepository::new(state.pool()).delete(user.id).await?;
    if !deleted {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user = %user.id, "Account deleted");
    Ok(Json(serde_json::json!({
        "message": "Account deleted successfully"
    })))
}

// =============================================================================
// Wishlist
// =============================================================================

/// Wishlist entry projection (name, price, and images only).
#[derive(Debug, Serialize)]
pub struct WishlistProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub images: Vec<String>,
}

impl From<Product> for WishlistProduct {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            price: product.price,
            images: product.images,
        }
    }
}

/// The calling user's wishlist, populated with product fields.
///
/// GET /api/users/wishlist
pub async fn get_wishlist(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<WishlistProduct>>> {
    let products = ProductRepository::new(state.pool())
        .get_many(&user.wishlist)
        .await?;

    // Present in wishlist order, dropping products that no longer exist.
    let mut by_id: std::collections::HashMap<ProductId, Product> =
        products.into_iter().map(|p| (p.id, p)).collect();
    let populated = user
        .wishlist
        .iter()
        .filter_map(|id| by_id.remove(id))
        .map(WishlistProduct::from)
        .collect();

    Ok(Json(populated))
}

/// Add a product to the wishlist.
///
/// POST /api/users/wishlist/{productId}
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<ProductId>>> {
    if !user.wishlist_add(product_id) {
        return Err(AppError::Validation(
            "Product already in wishlist".to_string(),
        ));
    }

    UserRepository::new(state.pool()).save(&user).await?;
    Ok(Json(user.wishlist))
}

/// Remove a product from the wishlist.
///
/// DELETE /api/users/wishlist/{productId}
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    AuthUser(mut user): AuthUser,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Vec<ProductId>>> {
    user.wishlist_remove(product_id);
    UserRepository::new(state.pool()).save(&user).await?;
    Ok(Json(user.wishlist))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_address_keeps_old_values() {
        let existing = Address {
            street: Some("14 Temple Rd".to_string()),
            city: Some("Mysuru".to_string()),
            state: Some("KA".to_string()),
            zip_code: Some("570001".to_string()),
            country: Some("India".to_string()),
        };
        let body = UpdateProfileRequest {
            city: Some("Bengaluru".to_string()),
            ..Default::default()
        };

        let merged = merge_address(Some(existing), &body);
        assert_eq!(merged.street.as_deref(), Some("14 Temple Rd"));
        assert_eq!(merged.city.as_deref(), Some("Bengaluru"));
        assert_eq!(merged.zip_code.as_deref(), Some("570001"));
    }

    #[test]
    fn test_merge_address_defaults_country() {
        let merged = merge_address(None, &UpdateProfileRequest::default());
        assert_eq!(merged.country.as_deref(), Some(DEFAULT_COUNTRY));
        assert_eq!(merged.street, None);
    }

    #[test]
    fn test_merge_address_ignores_blank_fields() {
        let existing = Address {
            street: Some("14 Temple Rd".to_string()),
            ..Default::default()
        };
        let body = UpdateProfileRequest {
            address: Some("   ".to_string()),
            ..Default::default()
        };
        let merged = merge_address(Some(existing), &body);
        assert_eq!(merged.street.as_deref(), Some("14 Temple Rd"));
    }
}

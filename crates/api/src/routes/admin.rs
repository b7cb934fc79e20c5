//! Admin dashboard route handlers: stats, user management, and order
//! management. Every handler here requires the admin role.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use banyan_core::{Email, OrderId, OrderStatus, Role, UserId};

use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::AdminUser;
use crate::models::order::Order;
use crate::models::user::UserDetail;
use crate::routes::orders::{OrderWithUser, populate_user, populate_users};
use crate::state::AppState;

// =============================================================================
// Dashboard
// =============================================================================

/// Dashboard headline numbers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: i64,
    pub total_products: i64,
    pub total_sales: Decimal,
    pub total_orders: i64,
}

/// Counts and gross sales for the dashboard.
///
/// GET /api/admin/stats
pub async fn stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<StatsResponse>> {
    let users = UserRepository::new(state.pool());
    let products = ProductRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());

    Ok(Json(StatsResponse {
        total_users: users.count().await?,
        total_products: products.count().await?,
        total_sales: orders.total_sales().await?,
        total_orders: orders.count().await?,
    }))
}

// =============================================================================
// User Management
// =============================================================================

/// List every account.
///
/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<UserDetail>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users.iter().map(UserDetail::from).collect()))
}

/// One account by ID.
///
/// GET /api/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<UserId>,
) -> Result<Json<UserDetail>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserDetail::from(&user)))
}

/// One account's order history, newest first.
///
/// GET /api/admin/users/{id}/orders
pub async fn user_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<UserId>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list_for_user(id).await?;
    Ok(Json(orders))
}

/// Admin user update request. Passwords are deliberately absent - they
/// only change through the owner's own flows.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub is_verified: Option<bool>,
    pub phone: Option<String>,
}

/// Update an account's fields.
///
/// PUT /api/admin/users/{id}
#[instrument(skip_all, fields(admin = %admin.id, user = %id))]
pub async fn update_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<UserId>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserDetail>> {
    let repo = UserRepository::new(state.pool());
    let mut user = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(name) = body.name.filter(|n| !n.trim().is_empty()) {
        user.name = name.trim().to_owned();
    }
    if let Some(raw_email) = body.email.filter(|e| !e.trim().is_empty()) {
        let email = Email::parse(&raw_email)
            .map_err(|_| AppError::Validation("Please enter a valid email".to_string()))?;
        if email != user.email && repo.get_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
        user.email = email;
    }
    if let Some(role) = body.role {
        user.role = role
            .parse::<Role>()
            .map_err(|_| AppError::Validation("Invalid role".to_string()))?;
    }
    if let Some(is_verified) = body.is_verified {
        user.is_verified = is_verified;
    }
    if let Some(phone) = body.phone {
        user.phone = Some(phone).filter(|p| !p.trim().is_empty());
    }

    repo.save(&user).await?;
    Ok(Json(UserDetail::from(&user)))
}

/// Delete an account.
///
/// DELETE /api/admin/users/{id}
#[instrument(skip_all, fields(admin = %admin.id, user = %id))]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse> {
    let repo = UserRepository::new(state.pool());
    if repo.get_by_id(id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    repo.delete(id).await?;
    Ok(Json(serde_json::json!({
        "message": "User deleted successfully"
    })))
}

// =============================================================================
// Order Management
// =============================================================================

/// Every order, newest first, with owners populated.
///
/// GET /api/admin/orders
pub async fn list_orders(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Json<Vec<OrderWithUser>>> {
    // The dashboard order screen shows everything; pagination lives on
    // the /api/orders listing.
    let orders = OrderRepository::new(state.pool()).list().await?;

    let populated = populate_users(&state, orders).await?;
    tracing::debug!(count = populated.len(), "Returning admin order listing");
    Ok(Json(populated))
}

/// One order with its owner populated.
///
/// GET /api/admin/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithUser>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    Ok(Json(populate_user(&state, order).await?))
}

/// Status change request body.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
}

/// Set an order's status from the dashboard.
///
/// PUT /api/admin/orders/{id}
#[instrument(skip_all, fields(admin = %admin.id, order = %id))]
pub async fn update_order(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateOrderRequest>,
) -> Result<Json<Order>> {
    let Some(raw_status) = body.status else {
        return Err(AppError::Validation("Status is required".to_string()));
    };
    let status = raw_status
        .parse::<OrderStatus>()
        .map_err(|_| AppError::Validation("Invalid status".to_string()))?;

    let order = crate::services::orders::OrderService::new(state.pool())
        .update_status(id, status)
        .await?;

    Ok(Json(order))
}

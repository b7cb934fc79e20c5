//! Order route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use banyan_core::{OrderId, OrderStatus};

use crate::db::orders::OrderRepository;
use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{AdminUser, AuthUser};
use crate::models::order::{Order, PaymentResult};
use crate::models::user::{PublicUser, User};
use crate::services::orders::{OrderDraft, OrderService};
use crate::state::AppState;

// =============================================================================
// Response Types
// =============================================================================

/// An order with its owner's public fields populated.
///
/// `user` is absent when the owning account has since been deleted;
/// orders outlive accounts.
#[derive(Debug, Serialize)]
pub struct OrderWithUser {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}

/// Admin order listing page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<OrderWithUser>,
    pub total_pages: i64,
    pub current_page: i64,
}

/// Query parameters for the admin order listing.
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// =============================================================================
// Handlers
// =============================================================================

/// List all orders with optional status filter and pagination.
///
/// GET /api/orders?status=&page=&limit=
pub async fn list(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<OrderPage>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<OrderStatus>()
                .map_err(|_| AppError::Validation("Invalid status".to_string()))
        })
        .transpose()?;
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let (orders, total) = OrderRepository::new(state.pool())
        .list_paged(status, limit, (page - 1) * limit)
        .await?;

    let orders = populate_users(&state, orders).await?;

    Ok(Json(OrderPage {
        orders,
        total_pages: total.div_ceil(limit),
        current_page: page,
    }))
}

/// The calling user's own orders, newest first.
///
/// GET /api/orders/my-orders
pub async fn my_orders(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// A single order; owner or admin only.
///
/// GET /api/orders/{id}
pub async fn get(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderWithUser>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    require_owner_or_admin(&order, &user)?;

    let populated = populate_user(&state, order).await?;
    Ok(Json(populated))
}

/// Create an order.
///
/// POST /api/orders
///
/// Stock decrements are best-effort per item; a degraded decrement is
/// logged and counted but never fails the request.
#[instrument(skip(state, user, draft), fields(user = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(draft): Json<OrderDraft>,
) -> Result<impl IntoResponse> {
    let outcome = OrderService::new(state.pool()).create(user.id, draft).await?;

    if !outcome.degraded.is_empty() {
        tracing::warn!(
            order = %outcome.order.id,
            degraded = outcome.degraded.len(),
            "Order created with degraded stock updates"
        );
    }

    let populated = OrderWithUser {
        order: outcome.order,
        user: Some(user.public()),
    };

    Ok((StatusCode::CREATED, Json(populated)))
}

/// Status update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Set an order's status (admin).
///
/// PUT /api/orders/{id}/status
#[instrument(skip(state, admin, body), fields(admin = %admin.id, order = %id))]
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<OrderId>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let status = body
        .status
        .parse::<OrderStatus>()
        .map_err(|_| AppError::Validation("Invalid status".to_string()))?;

    let order = OrderService::new(state.pool()).update_status(id, status).await?;
    Ok(Json(order))
}

/// Payment confirmation request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayRequest {
    pub payment_result: Option<PaymentResult>,
}

/// Record a confirmed payment; owner or admin only.
///
/// PUT /api/orders/{id}/pay
#[instrument(skip(state, user, body), fields(user = %user.id, order = %id))]
pub async fn pay(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<OrderId>,
    Json(body): Json<PayRequest>,
) -> Result<Json<Order>> {
    let result = body
        .payment_result
        .ok_or_else(|| AppError::Validation("Payment result is required".to_string()))?;

    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

    require_owner_or_admin(&order, &user)?;

    let order = OrderService::new(state.pool()).record_payment(id, result).await?;
    Ok(Json(order))
}

// =============================================================================
// Helpers
// =============================================================================

/// Orders are visible to their owner and to admins.
fn require_owner_or_admin(order: &Order, user: &User) -> Result<()> {
    if order.user_id == user.id || user.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not authorized".to_string()))
    }
}

/// Attach the owning user's public fields to one order.
pub(crate) async fn populate_user(state: &AppState, order: Order) -> Result<OrderWithUser> {
    let user = UserRepository::new(state.pool())
        .get_by_id(order.user_id)
        .await?
        .map(|u| u.public());

    Ok(OrderWithUser { order, user })
}

/// Attach owner fields to a page of orders.
pub(crate) async fn populate_users(state: &AppState, orders: Vec<Order>) -> Result<Vec<OrderWithUser>> {
    let mut populated = Vec::with_capacity(orders.len());
    for order in orders {
        populated.push(populate_user(state, order).await?);
    }
    Ok(populated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use banyan_core::{Email, PaymentMethod, Role, UserId};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn order_owned_by(user_id: UserId) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::generate(),
            user_id,
            items: Vec::new(),
            shipping_address: crate::models::order::ShippingAddress {
                full_name: "A".to_string(),
                email: "a@b.c".to_string(),
                street: "s".to_string(),
                city: "c".to_string(),
                state: "st".to_string(),
                zip_code: "z".to_string(),
                country: "in".to_string(),
            },
            payment_method: PaymentMethod::Upi,
            payment_result: None,
            total_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            shipping_amount: Decimal::ZERO,
            status: banyan_core::OrderStatus::Pending,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn user_with(id: UserId, role: Role) -> User {
        let now = Utc::now();
        User {
            id,
            name: "U".to_string(),
            email: Email::parse("u@example.com").expect("valid"),
            password_hash: String::new(),
            role,
            is_verified: true,
            phone: None,
            address: None,
            wishlist: Vec::new(),
            reset_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_owner_can_access_own_order() {
        let id = UserId::generate();
        let order = order_owned_by(id);
        let user = user_with(id, Role::Customer);
        assert!(require_owner_or_admin(&order, &user).is_ok());
    }

    #[test]
    fn test_admin_can_access_any_order() {
        let order = order_owned_by(UserId::generate());
        let admin = user_with(UserId::generate(), Role::Admin);
        assert!(require_owner_or_admin(&order, &admin).is_ok());
    }

    #[test]
    fn test_stranger_is_forbidden() {
        let order = order_owned_by(UserId::generate());
        let stranger = user_with(UserId::generate(), Role::Customer);
        assert!(matches!(
            require_owner_or_admin(&order, &stranger),
            Err(AppError::Forbidden(_))
        ));
    }
}

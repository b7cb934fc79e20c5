//! Order processing.
//!
//! Order creation validates the draft, decrements stock per item on a
//! best-effort basis, and persists the aggregate. Totals are taken from
//! the client when supplied and otherwise summed from the client's own
//! line prices - there is deliberately no re-pricing against the catalog
//! here; that trust boundary is documented behavior the storefront
//! depends on, recorded in DESIGN.md rather than silently changed.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use banyan_core::{OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::models::order::{Order, OrderItem, PaymentResult, ShippingAddress};

/// Errors that can occur while processing orders.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Draft failed validation; the message is client-facing.
    #[error("{0}")]
    Validation(String),

    /// Order not found.
    #[error("order not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Incoming order payload, exactly as the client sends it.
///
/// Everything is optional at this layer; [`validate_draft`] turns the
/// draft into domain values or a client-facing validation message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[serde(default)]
    pub items: Vec<OrderItemDraft>,
    pub shipping_address: Option<ShippingAddressDraft>,
    pub payment_method: Option<String>,
    pub total_amount: Option<Decimal>,
}

/// One line of an incoming order.
#[derive(Debug, Default, Deserialize)]
pub struct OrderItemDraft {
    pub product: Option<ProductId>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<u32>,
    pub image: Option<String>,
}

/// Incoming shipping address with every field still optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressDraft {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

/// A per-item stock update that failed.
///
/// Stock updates never abort order creation; the failures ride along in
/// the outcome so callers can log, alert, or reconcile.
#[derive(Debug)]
pub struct StockFailure {
    pub product: ProductId,
    pub detail: String,
}

/// The result of creating an order: the persisted aggregate plus any
/// degraded sub-operations.
#[derive(Debug)]
pub struct OrderOutcome {
    pub order: Order,
    pub degraded: Vec<StockFailure>,
}

/// Order processing service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
        }
    }

    /// Create an order for `user` from a client draft.
    ///
    /// Validation happens before any datastore write, so a rejected draft
    /// never moves stock. Each item's stock decrement is independent and
    /// best-effort: a failed update is logged, recorded in the outcome's
    /// `degraded` list, and does not abort the order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Validation` for a malformed draft.
    /// Returns `OrderError::Repository` if persisting the order fails.
    pub async fn create(
        &self,
        user_id: UserId,
        draft: OrderDraft,
    ) -> Result<OrderOutcome, OrderError> {
        let (items, shipping_address, payment_method, total_amount) = validate_draft(draft)?;
        let total_amount =
            total_amount.unwrap_or_else(|| items.iter().map(OrderItem::line_total).sum());

        let mut degraded = Vec::new();
        for item in &items {
            let Some(product_id) = item.product else {
                continue;
            };
            if let Err(failure) = self.decrement_stock(product_id, item.quantity).await {
                tracing::warn!(
                    product = %product_id,
                    error = %failure.detail,
                    "Stock update failed; continuing with order creation"
                );
                degraded.push(failure);
            }
        }

        let now = Utc::now();
        let order = Order {
            id: OrderId::generate(),
            user_id,
            items,
            shipping_address,
            payment_method,
            payment_result: None,
            total_amount,
            tax_amount: Decimal::ZERO,
            shipping_amount: Decimal::ZERO,
            status: OrderStatus::Pending,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        };

        self.orders.create(&order).await?;
        tracing::info!(order = %order.id, user = %user_id, "Order created");

        Ok(OrderOutcome { order, degraded })
    }

    /// Fetch, clamp, and write back one product's stock level.
    ///
    /// Read-modify-write on purpose: concurrent orders for the same
    /// product race last-writer-wins, same as every other document write
    /// in this store.
    async fn decrement_stock(
        &self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), StockFailure> {
        let product = match self.products.get(product_id).await {
            Ok(Some(product)) => product,
            Ok(None) => {
                // Snapshot items may reference products that were since
                // deleted; nothing to decrement.
                tracing::debug!(product = %product_id, "Ordered product no longer exists");
                return Ok(());
            }
            Err(e) => {
                return Err(StockFailure {
                    product: product_id,
                    detail: e.to_string(),
                });
            }
        };

        let new_stock = clamped_stock(product.stock, quantity);
        self.products
            .set_stock(product_id, new_stock)
            .await
            .map_err(|e| StockFailure {
                product: product_id,
                detail: e.to_string(),
            })?;

        tracing::info!(product = %product_id, stock = new_stock, "Stock updated");
        Ok(())
    }

    /// Set an order's status (admin operation).
    ///
    /// Transitioning to `delivered` also stamps `is_delivered` and
    /// `delivered_at`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        order.transition(status, Utc::now());
        self.orders.save(&order).await?;

        Ok(order)
    }

    /// Record a confirmed payment on an order.
    ///
    /// Ownership (owner-or-admin) is the route layer's concern; this
    /// applies the state change.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order doesn't exist.
    pub async fn record_payment(
        &self,
        order_id: OrderId,
        result: PaymentResult,
    ) -> Result<Order, OrderError> {
        let mut order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        order.record_payment(result, Utc::now());
        self.orders.save(&order).await?;

        Ok(order)
    }
}

/// Stock after removing `quantity` units, clamped at zero.
#[must_use]
pub fn clamped_stock(stock: i32, quantity: u32) -> i32 {
    let quantity = i32::try_from(quantity).unwrap_or(i32::MAX);
    stock.saturating_sub(quantity).max(0)
}

/// Turn a client draft into validated domain values.
///
/// # Errors
///
/// Returns `OrderError::Validation` with a client-facing message naming
/// what is missing or malformed.
#[allow(clippy::type_complexity)]
pub fn validate_draft(
    draft: OrderDraft,
) -> Result<(Vec<OrderItem>, ShippingAddress, PaymentMethod, Option<Decimal>), OrderError> {
    if draft.items.is_empty() {
        return Err(OrderError::Validation("Items are required".to_string()));
    }

    let Some(address) = draft.shipping_address else {
        return Err(OrderError::Validation(
            "Shipping address is required".to_string(),
        ));
    };
    let shipping_address = validate_address(address)?;

    let Some(method) = draft.payment_method.as_deref() else {
        return Err(OrderError::Validation(
            "Payment method is required".to_string(),
        ));
    };
    let payment_method = method.parse::<PaymentMethod>().map_err(|_| {
        OrderError::Validation(
            "Invalid payment method. Must be one of: cash_on_delivery, credit_card, upi, paypal"
                .to_string(),
        )
    })?;

    let items = draft
        .items
        .into_iter()
        .map(|item| OrderItem {
            product: item.product,
            name: item
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "Unknown Product".to_string()),
            price: item.price.unwrap_or(Decimal::ZERO).max(Decimal::ZERO),
            quantity: item.quantity.filter(|q| *q >= 1).unwrap_or(1),
            image: item.image.unwrap_or_default(),
        })
        .collect();

    Ok((items, shipping_address, payment_method, draft.total_amount))
}

/// Require every shipping-address field, naming the missing ones.
fn validate_address(draft: ShippingAddressDraft) -> Result<ShippingAddress, OrderError> {
    let mut missing = Vec::new();
    let mut require = |value: Option<String>, wire_name: &'static str| {
        match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => v,
            None => {
                missing.push(wire_name);
                String::new()
            }
        }
    };

    let address = ShippingAddress {
        full_name: require(draft.full_name, "fullName"),
        email: require(draft.email, "email"),
        street: require(draft.street, "street"),
        city: require(draft.city, "city"),
        state: require(draft.state, "state"),
        zip_code: require(draft.zip_code, "zipCode"),
        country: require(draft.country, "country"),
    };

    if missing.is_empty() {
        Ok(address)
    } else {
        Err(OrderError::Validation(format!(
            "Missing required shipping address fields: {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn full_address() -> ShippingAddressDraft {
        ShippingAddressDraft {
            full_name: Some("Asha Rao".to_string()),
            email: Some("asha@example.com".to_string()),
            street: Some("14 Temple Rd".to_string()),
            city: Some("Mysuru".to_string()),
            state: Some("KA".to_string()),
            zip_code: Some("570001".to_string()),
            country: Some("India".to_string()),
        }
    }

    fn item(price: i64, quantity: u32) -> OrderItemDraft {
        OrderItemDraft {
            product: Some(ProductId::generate()),
            name: Some("Item".to_string()),
            price: Some(Decimal::new(price, 2)),
            quantity: Some(quantity),
            image: None,
        }
    }

    #[test]
    fn test_empty_items_rejected() {
        let draft = OrderDraft {
            items: Vec::new(),
            shipping_address: Some(full_address()),
            payment_method: Some("upi".to_string()),
            total_amount: None,
        };
        let err = validate_draft(draft).unwrap_err();
        assert!(matches!(err, OrderError::Validation(ref m) if m.contains("Items")));
    }

    #[test]
    fn test_missing_address_fields_are_named() {
        let mut address = full_address();
        address.zip_code = None;
        address.country = Some("  ".to_string());

        let draft = OrderDraft {
            items: vec![item(100, 1)],
            shipping_address: Some(address),
            payment_method: Some("upi".to_string()),
            total_amount: None,
        };
        let err = validate_draft(draft).unwrap_err();
        let OrderError::Validation(message) = err else {
            panic!("expected validation error");
        };
        assert!(message.contains("zipCode"));
        assert!(message.contains("country"));
        assert!(!message.contains("street"));
    }

    #[test]
    fn test_unknown_payment_method_rejected() {
        let draft = OrderDraft {
            items: vec![item(100, 1)],
            shipping_address: Some(full_address()),
            payment_method: Some("barter".to_string()),
            total_amount: None,
        };
        assert!(matches!(
            validate_draft(draft),
            Err(OrderError::Validation(ref m)) if m.contains("payment method")
        ));
    }

    #[test]
    fn test_credit_card_alias_accepted() {
        let draft = OrderDraft {
            items: vec![item(100, 1)],
            shipping_address: Some(full_address()),
            payment_method: Some("credit-card".to_string()),
            total_amount: None,
        };
        let (_, _, method, _) = validate_draft(draft).unwrap();
        assert_eq!(method, PaymentMethod::CreditCard);
    }

    #[test]
    fn test_item_defaults_applied() {
        let draft = OrderDraft {
            items: vec![OrderItemDraft::default()],
            shipping_address: Some(full_address()),
            payment_method: Some("paypal".to_string()),
            total_amount: None,
        };
        let (items, _, _, _) = validate_draft(draft).unwrap();
        let item = items.first().unwrap();
        assert_eq!(item.name, "Unknown Product");
        assert_eq!(item.price, Decimal::ZERO);
        assert_eq!(item.quantity, 1);
        assert_eq!(item.image, "");
    }

    #[test]
    fn test_zero_quantity_becomes_one() {
        let draft = OrderDraft {
            items: vec![item(100, 0)],
            shipping_address: Some(full_address()),
            payment_method: Some("upi".to_string()),
            total_amount: None,
        };
        let (items, _, _, _) = validate_draft(draft).unwrap();
        assert_eq!(items.first().unwrap().quantity, 1);
    }

    #[test]
    fn test_total_summed_from_items_when_absent() {
        let draft = OrderDraft {
            items: vec![item(10_000, 2), item(2_550, 3)],
            shipping_address: Some(full_address()),
            payment_method: Some("upi".to_string()),
            total_amount: None,
        };
        let (items, _, _, total) = validate_draft(draft).unwrap();
        assert_eq!(total, None);
        let summed: Decimal = items.iter().map(OrderItem::line_total).sum();
        // 2 x 100.00 + 3 x 25.50
        assert_eq!(summed, Decimal::new(27_650, 2));
    }

    #[test]
    fn test_client_total_wins_when_present() {
        let draft = OrderDraft {
            items: vec![item(10_000, 1)],
            shipping_address: Some(full_address()),
            payment_method: Some("upi".to_string()),
            total_amount: Some(Decimal::new(9_900, 2)),
        };
        let (_, _, _, total) = validate_draft(draft).unwrap();
        assert_eq!(total, Some(Decimal::new(9_900, 2)));
    }

    #[test]
    fn test_clamped_stock_never_negative() {
        assert_eq!(clamped_stock(5, 2), 3);
        assert_eq!(clamped_stock(1, 3), 0);
        assert_eq!(clamped_stock(0, 1), 0);
        assert_eq!(clamped_stock(10, u32::MAX), 0);
    }
}

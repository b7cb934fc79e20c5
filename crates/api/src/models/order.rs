//! Order aggregate domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use banyan_core::{OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

/// A line item captured at order time.
///
/// This is a snapshot, not a join: the name, price, and image are copied
/// from the client's cart when the order is created and stay frozen even
/// if the product later changes or disappears.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    /// Reference to the catalog product, when the client supplied one.
    /// Items without a reference skip the stock decrement.
    pub product: Option<ProductId>,
    pub name: String,
    pub price: Decimal,
    /// Always at least 1.
    pub quantity: u32,
    pub image: String,
}

impl OrderItem {
    /// The line total (`price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Destination postal record; every field is required at order creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub email: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

/// Opaque record returned by the external payment provider.
///
/// Field names follow the provider's payload and are stored verbatim.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentResult {
    pub id: Option<String>,
    pub status: Option<String>,
    pub update_time: Option<String>,
    pub email_address: Option<String>,
}

/// An order aggregate (domain type).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Owning user. Kept even after the account is deleted.
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_result: Option<PaymentResult>,
    pub total_amount: Decimal,
    pub tax_amount: Decimal,
    pub shipping_amount: Decimal,
    pub status: OrderStatus,
    pub is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Move the order to `status`, stamping delivery state when the
    /// transition is to `delivered`.
    pub fn transition(&mut self, status: OrderStatus, now: DateTime<Utc>) {
        self.status = status;
        if status == OrderStatus::Delivered {
            self.is_delivered = true;
            self.delivered_at = Some(now);
        }
    }

    /// Record a confirmed payment.
    pub fn record_payment(&mut self, result: PaymentResult, now: DateTime<Utc>) {
        self.is_paid = true;
        self.paid_at = Some(now);
        self.payment_result = Some(result);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_order() -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::generate(),
            user_id: UserId::generate(),
            items: vec![OrderItem {
                product: Some(ProductId::generate()),
                name: "Silk stole".to_string(),
                price: Decimal::new(120_000, 2),
                quantity: 2,
                image: String::new(),
            }],
            shipping_address: ShippingAddress {
                full_name: "Asha Rao".to_string(),
                email: "asha@example.com".to_string(),
                street: "14 Temple Rd".to_string(),
                city: "Mysuru".to_string(),
                state: "KA".to_string(),
                zip_code: "570001".to_string(),
                country: "India".to_string(),
            },
            payment_method: PaymentMethod::Upi,
            payment_result: None,
            total_amount: Decimal::new(240_000, 2),
            tax_amount: Decimal::ZERO,
            shipping_amount: Decimal::ZERO,
            status: OrderStatus::Pending,
            is_paid: false,
            paid_at: None,
            is_delivered: false,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_line_total() {
        let item = OrderItem {
            product: None,
            name: "Clay lamp".to_string(),
            price: Decimal::new(9_950, 2),
            quantity: 3,
            image: String::new(),
        };
        assert_eq!(item.line_total(), Decimal::new(29_850, 2));
    }

    #[test]
    fn test_transition_to_delivered_stamps_flags() {
        let mut order = sample_order();
        let now = Utc::now();

        order.transition(OrderStatus::Shipped, now);
        assert!(!order.is_delivered);
        assert_eq!(order.delivered_at, None);

        order.transition(OrderStatus::Delivered, now);
        assert!(order.is_delivered);
        assert_eq!(order.delivered_at, Some(now));
        assert_eq!(order.status, OrderStatus::Delivered);
    }

    #[test]
    fn test_record_payment_sets_pair() {
        let mut order = sample_order();
        let now = Utc::now();
        order.record_payment(
            PaymentResult {
                id: Some("PAY-123".to_string()),
                status: Some("COMPLETED".to_string()),
                update_time: None,
                email_address: Some("asha@example.com".to_string()),
            },
            now,
        );
        assert!(order.is_paid);
        assert_eq!(order.paid_at, Some(now));
        assert_eq!(
            order.payment_result.as_ref().unwrap().id.as_deref(),
            Some("PAY-123")
        );
        // Delivery state is independent of payment state.
        assert!(!order.is_delivered);
    }

    #[test]
    fn test_wire_shape_uses_camel_case() {
        let order = sample_order();
        let json = serde_json::to_value(&order).unwrap();
        assert!(json.get("totalAmount").is_some());
        assert!(json.get("isPaid").is_some());
        assert!(json.get("shippingAddress").is_some());
        assert!(json.get("total_amount").is_none());
    }
}

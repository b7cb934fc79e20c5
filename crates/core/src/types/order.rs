//! Order status and payment method enums.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// Orders start `pending`; admins move them forward. `delivered` is the
/// only transition with a side effect (it stamps the delivery flag and
/// timestamp on the order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}

/// Accepted payment methods.
///
/// `credit-card` is accepted on the wire as an alias for `credit_card`;
/// storefront clients have shipped both spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CashOnDelivery,
    #[serde(alias = "credit-card")]
    CreditCard,
    Upi,
    Paypal,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CashOnDelivery => write!(f, "cash_on_delivery"),
            Self::CreditCard => write!(f, "credit_card"),
            Self::Upi => write!(f, "upi"),
            Self::Paypal => write!(f, "paypal"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            // The hyphenated spelling predates the normalized enum.
            "credit_card" | "credit-card" => Ok(Self::CreditCard),
            "upi" => Ok(Self::Upi),
            "paypal" => Ok(Self::Paypal),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::from_str(&status.to_string()), Ok(status));
        }
    }

    #[test]
    fn test_status_rejects_unknown() {
        assert!(OrderStatus::from_str("confirmed").is_err());
        assert!(OrderStatus::from_str("").is_err());
    }

    #[test]
    fn test_payment_method_round_trip() {
        for method in [
            PaymentMethod::CashOnDelivery,
            PaymentMethod::CreditCard,
            PaymentMethod::Upi,
            PaymentMethod::Paypal,
        ] {
            assert_eq!(PaymentMethod::from_str(&method.to_string()), Ok(method));
        }
    }

    #[test]
    fn test_credit_card_alias() {
        assert_eq!(
            PaymentMethod::from_str("credit-card"),
            Ok(PaymentMethod::CreditCard)
        );
        let from_json: PaymentMethod =
            serde_json::from_str("\"credit-card\"").expect("alias deserializes");
        assert_eq!(from_json, PaymentMethod::CreditCard);
        // Serialization always uses the normalized spelling.
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CreditCard).expect("serialize"),
            "\"credit_card\""
        );
    }
}

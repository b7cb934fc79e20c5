//! Product domain types and rating aggregation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use banyan_core::{ProductCategory, ProductId, UserId};

/// A single user's rating of a product.
///
/// At most one entry per user exists in a product's rating list; a repeat
/// submission replaces the stored value in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRating {
    /// The rating user.
    pub user: UserId,
    /// Star value, 1 through 5.
    pub rating: u8,
    /// When the rating was first given or last changed.
    pub date: DateTime<Utc>,
}

/// A catalog product (domain type).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit price, never negative.
    pub price: Decimal,
    pub category: ProductCategory,
    /// Units on hand; decremented by order creation and clamped at zero.
    pub stock: i32,
    /// Ordered image URLs; at least one at creation, replaced wholesale
    /// when an update supplies new files.
    pub images: Vec<String>,
    pub ratings: Vec<ProductRating>,
    /// Arithmetic mean of `ratings`; absent while the list is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Upsert `user`'s rating and recompute the mean.
    ///
    /// The caller validates the 1-5 range; this only maintains the
    /// one-entry-per-user and mean invariants.
    pub fn apply_rating(&mut self, user: UserId, rating: u8, now: DateTime<Utc>) {
        match self.ratings.iter_mut().find(|r| r.user == user) {
            Some(existing) => existing.rating = rating,
            None => self.ratings.push(ProductRating {
                user,
                rating,
                date: now,
            }),
        }
        self.average_rating = mean_rating(&self.ratings);
    }

    /// Look up `user`'s rating, if they have one.
    #[must_use]
    pub fn rating_by(&self, user: UserId) -> Option<u8> {
        self.ratings.iter().find(|r| r.user == user).map(|r| r.rating)
    }
}

/// Arithmetic mean of a rating list; `None` when empty.
#[must_use]
pub fn mean_rating(ratings: &[ProductRating]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: u32 = ratings.iter().map(|r| u32::from(r.rating)).sum();
    #[allow(clippy::cast_precision_loss)] // rating counts stay far below 2^52
    Some(f64::from(sum) / ratings.len() as f64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_product() -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::generate(),
            name: "Bamboo basket".to_string(),
            description: "Hand-woven".to_string(),
            price: Decimal::new(34_900, 2),
            category: ProductCategory::Handicrafts,
            stock: 5,
            images: vec!["/uploads/basket.jpg".to_string()],
            ratings: Vec::new(),
            average_rating: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_mean_rating_empty_is_none() {
        assert_eq!(mean_rating(&[]), None);
    }

    #[test]
    fn test_apply_rating_appends_and_averages() {
        let mut product = sample_product();
        let now = Utc::now();
        let alice = UserId::generate();
        let bob = UserId::generate();

        product.apply_rating(alice, 5, now);
        assert_eq!(product.average_rating, Some(5.0));

        product.apply_rating(bob, 2, now);
        assert_eq!(product.ratings.len(), 2);
        assert_eq!(product.average_rating, Some(3.5));
    }

    #[test]
    fn test_apply_rating_replaces_existing_entry() {
        let mut product = sample_product();
        let now = Utc::now();
        let alice = UserId::generate();

        product.apply_rating(alice, 1, now);
        product.apply_rating(alice, 4, now);

        assert_eq!(product.ratings.len(), 1);
        assert_eq!(product.average_rating, Some(4.0));
        assert_eq!(product.rating_by(alice), Some(4));
    }

    #[test]
    fn test_mean_is_stable_without_writes() {
        let mut product = sample_product();
        let now = Utc::now();
        product.apply_rating(UserId::generate(), 3, now);
        product.apply_rating(UserId::generate(), 4, now);

        let first = product.average_rating;
        let second = mean_rating(&product.ratings);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rating_by_unknown_user_is_none() {
        let product = sample_product();
        assert_eq!(product.rating_by(UserId::generate()), None);
    }

    #[test]
    fn test_absent_average_not_serialized() {
        let product = sample_product();
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("averageRating").is_none());
        assert!(json.get("images").is_some());
    }
}

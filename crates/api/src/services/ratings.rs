//! Product rating aggregation.

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;

use banyan_core::{ProductId, UserId};

use crate::db::RepositoryError;
use crate::db::products::ProductRepository;

/// Errors that can occur while recording or reading ratings.
#[derive(Debug, Error)]
pub enum RatingError {
    /// Rating outside the 1-5 range.
    #[error("rating must be between 1 and 5")]
    InvalidRating,

    /// Product (or the user's rating of it) not found.
    #[error("not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Upserts per-user ratings and keeps the mean current.
pub struct RatingService<'a> {
    products: ProductRepository<'a>,
}

impl<'a> RatingService<'a> {
    /// Create a new rating service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
        }
    }

    /// Record `user`'s rating of a product and return the new mean.
    ///
    /// A repeat rating replaces the user's previous entry instead of
    /// adding a second one. The whole ratings list travels as one
    /// document, so two users rating simultaneously race
    /// last-writer-wins.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::InvalidRating` outside [1, 5].
    /// Returns `RatingError::NotFound` if the product doesn't exist.
    pub async fn rate(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: u8,
    ) -> Result<f64, RatingError> {
        if !(1..=5).contains(&rating) {
            return Err(RatingError::InvalidRating);
        }

        let mut product = self
            .products
            .get(product_id)
            .await?
            .ok_or(RatingError::NotFound)?;

        product.apply_rating(user_id, rating, Utc::now());
        self.products.save(&product).await?;

        // A just-rated product always has at least one entry.
        Ok(product.average_rating.unwrap_or(f64::from(rating)))
    }

    /// Look up `user`'s own rating of a product.
    ///
    /// # Errors
    ///
    /// Returns `RatingError::NotFound` if the product doesn't exist or
    /// the user hasn't rated it.
    pub async fn user_rating(
        &self,
        product_id: ProductId,
        user_id: UserId,
    ) -> Result<u8, RatingError> {
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(RatingError::NotFound)?;

        product.rating_by(user_id).ok_or(RatingError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_check_is_inclusive() {
        // The service rejects out-of-range values before touching the
        // datastore; the boundary itself is what matters here.
        for rating in [1u8, 5] {
            assert!((1..=5).contains(&rating), "{rating} should be accepted");
        }
        for rating in [0u8, 6] {
            assert!(!(1..=5).contains(&rating), "{rating} should be rejected");
        }
    }
}
